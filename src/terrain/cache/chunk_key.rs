// ============================================
// Chunk Coord - Идентификатор чанка
// ============================================

use ultraviolet::Vec2;

/// Координата чанка на сетке: (x, z) в единицах `chunk_size`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Чанк, в центр которого ближе всего попадает точка (x, z)
    #[inline]
    pub fn containing(position: Vec2, chunk_size: f32) -> Self {
        Self {
            x: (position.x / chunk_size).round() as i32,
            z: (position.y / chunk_size).round() as i32,
        }
    }

    /// Центр чанка в мировых координатах (x, z)
    #[inline]
    pub fn world_center(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.z as f32 * chunk_size)
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self { x: self.x + dx, z: self.z + dz }
    }
}

/// Квадрат на плоскости XZ вокруг центра чанка
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Bounds2 {
    pub center: Vec2,
    pub half_extent: f32,
}

impl Bounds2 {
    pub fn new(center: Vec2, size: f32) -> Self {
        Self { center, half_extent: size * 0.5 }
    }

    pub fn for_chunk(coord: ChunkCoord, chunk_size: f32) -> Self {
        Self::new(coord.world_center(chunk_size), chunk_size)
    }

    /// Квадрат расстояния от точки до ближайшей точки квадрата (0 внутри)
    #[inline]
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        let dx = ((point.x - self.center.x).abs() - self.half_extent).max(0.0);
        let dz = ((point.y - self.center.y).abs() - self.half_extent).max(0.0);
        dx * dx + dz * dz
    }

    #[inline]
    pub fn distance(&self, point: Vec2) -> f32 {
        self.sqr_distance(point).sqrt()
    }
}
