// ============================================
// Terrain Chunk - Состояние чанка в реестре
// ============================================

use std::sync::Arc;

use crate::terrain::cache::{Bounds2, ChunkCoord};
use crate::terrain::generation::MapData;
use crate::terrain::mesh::MeshData;

/// Карта высот чанка
#[derive(Debug, Clone)]
pub enum MapState {
    Absent,
    Requested,
    Ready(MapData),
}

/// Меш одного уровня LOD
#[derive(Debug, Clone)]
pub enum LodMeshState {
    Absent,
    Requested,
    Ready(Arc<MeshData>),
}

impl LodMeshState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LodMeshState::Ready(_))
    }
}

/// Чанк создаётся при первом попадании в окно видимости и больше не удаляется
#[derive(Debug)]
pub struct TerrainChunk {
    coord: ChunkCoord,
    bounds: Bounds2,
    pub(super) map: MapState,
    /// Индекс совпадает с индексом в таблице LOD
    pub(super) lod_meshes: Vec<LodMeshState>,
    pub(super) active_lod: Option<usize>,
    pub(super) visible: bool,
}

impl TerrainChunk {
    pub fn new(coord: ChunkCoord, chunk_size: f32, lod_count: usize) -> Self {
        Self {
            coord,
            bounds: Bounds2::for_chunk(coord, chunk_size),
            map: MapState::Absent,
            lod_meshes: vec![LodMeshState::Absent; lod_count],
            active_lod: None,
            visible: false,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn bounds(&self) -> &Bounds2 {
        &self.bounds
    }

    pub fn map_data(&self) -> Option<&MapData> {
        match &self.map {
            MapState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn has_map_data(&self) -> bool {
        matches!(self.map, MapState::Ready(_))
    }

    pub fn is_map_requested(&self) -> bool {
        matches!(self.map, MapState::Requested)
    }

    pub fn lod_mesh(&self, lod_index: usize) -> Option<&LodMeshState> {
        self.lod_meshes.get(lod_index)
    }

    /// Индекс LOD, чей меш сейчас показан
    pub fn active_lod(&self) -> Option<usize> {
        self.active_lod
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
