// ============================================
// Chunk Renderer - Потребитель готовых чанков
// ============================================

use std::sync::Arc;

use crate::terrain::cache::ChunkCoord;
use crate::terrain::generation::ColorMap;
use crate::terrain::mesh::MeshData;

/// Внешний получатель мешей и текстур. Вызывается только из главного потока.
pub trait ChunkRenderer {
    /// Меш выбранного LOD и текстура чанка готовы
    fn present(&mut self, coord: ChunkCoord, lod: usize, mesh: Arc<MeshData>, texture: Arc<ColorMap>);

    fn set_visible(&mut self, coord: ChunkCoord, visible: bool);
}

/// Рендерер, который ничего не делает (headless режим)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl ChunkRenderer for NullRenderer {
    fn present(&mut self, _coord: ChunkCoord, _lod: usize, _mesh: Arc<MeshData>, _texture: Arc<ColorMap>) {}

    fn set_visible(&mut self, _coord: ChunkCoord, _visible: bool) {}
}
