// ============================================
// Terrain Module - Процедурный стриминг террейна
// ============================================

pub mod cache;
pub mod generation;
pub mod lod;
pub mod manager;
pub mod mesh;

// Re-exports
pub use cache::{Bounds2, ChunkCoord};
pub use generation::{
    Color, ColorMap, GlobalFieldSampler, HeightCurve, HeightMap, HeightfieldColorizer, MapData,
    MapGenerator, NoiseField, NoiseSettings, NormalizeMode, TerrainType,
};
pub use lod::{LodInfo, LodTable};
pub use manager::{ChunkRenderer, ChunkStreamingManager, GenerationQueue, NullRenderer, TerrainChunk};
pub use mesh::{MeshBuilder, MeshData, TerrainVertex};
