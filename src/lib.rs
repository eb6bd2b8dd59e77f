// ============================================
// Terrain Streamer - Процедурный террейн с фоновой генерацией
// ============================================
// Фрактальный шум -> карты высот -> раскраска -> LOD меши,
// стриминг чанков вокруг движущегося зрителя.

pub mod core;
pub mod terrain;

pub use crate::core::{TerrainConfig, TerrainError};
pub use crate::terrain::*;
