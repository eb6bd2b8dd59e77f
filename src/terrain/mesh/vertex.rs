// ============================================
// Terrain Vertex - Структура вершины
// ============================================

/// Чередующаяся вершина для загрузки в вершинный буфер
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TerrainVertex {
    /// Размер вершины в байтах (шаг буфера)
    pub const STRIDE: usize = std::mem::size_of::<TerrainVertex>();

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }
}
