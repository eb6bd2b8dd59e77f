// ============================================
// Mesh Module - Геометрия чанков
// ============================================

mod builder;
mod data;
mod vertex;

pub use builder::{simplification_stride, vertices_per_line, MeshBuilder, DEFAULT_EDGE_SMOOTHING};
pub use data::MeshData;
pub use vertex::TerrainVertex;
