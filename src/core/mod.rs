// ============================================
// Core Module - Конфигурация и ошибки
// ============================================

pub mod config;
pub mod error;

pub use config::{MapSettings, StreamingSettings, TerrainConfig};
pub use error::TerrainError;
