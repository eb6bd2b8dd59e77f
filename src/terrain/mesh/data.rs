// ============================================
// Mesh Data - Вершины, индексы, UV
// ============================================

use ultraviolet::{Vec2, Vec3};

use super::vertex::TerrainVertex;

/// Готовая к отрисовке геометрия чанка.
/// `indices` - тройки индексов треугольников.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub uvs: Vec<Vec2>,
}

impl MeshData {
    /// Пустой меш с заранее выделенной памятью под сетку `width x height` вершин
    pub fn with_grid(width: usize, height: usize) -> Self {
        let quads = width.saturating_sub(1) * height.saturating_sub(1);
        Self {
            vertices: Vec::with_capacity(width * height),
            indices: Vec::with_capacity(quads * 6),
            uvs: Vec::with_capacity(width * height),
        }
    }

    #[inline]
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Нормали вершин: сумма нормалей прилегающих треугольников (взвешена площадью)
    pub fn compute_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::zero(); self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let pa = self.vertices[a];
            let face = (self.vertices[b] - pa).cross(self.vertices[c] - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for n in &mut normals {
            let len = n.mag();
            *n = if len > f32::EPSILON { *n / len } else { Vec3::unit_y() };
        }
        normals
    }

    /// Чередующиеся вершины с нормалями
    pub fn to_vertices(&self) -> Vec<TerrainVertex> {
        let normals = self.compute_normals();
        self.vertices
            .iter()
            .zip(&normals)
            .enumerate()
            .map(|(i, (p, n))| {
                let uv = self.uvs.get(i).copied().unwrap_or_else(Vec2::zero);
                TerrainVertex::new([p.x, p.y, p.z], [n.x, n.y, n.z], [uv.x, uv.y])
            })
            .collect()
    }

    /// Байты вершинного буфера
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.to_vertices()).to_vec()
    }

    /// Байты индексного буфера (u32)
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        let mut mesh = MeshData::with_grid(2, 2);
        mesh.vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
        ];
        mesh.uvs = vec![Vec2::zero(); 4];
        mesh.add_triangle(0, 3, 2);
        mesh.add_triangle(3, 0, 1);
        mesh
    }

    #[test]
    fn test_flat_quad_faces_up() {
        let normals = quad().compute_normals();
        for n in normals {
            assert!((n - Vec3::unit_y()).mag() < 1e-6);
        }
    }

    #[test]
    fn test_buffer_sizes() {
        let mesh = quad();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_bytes().len(), 4 * TerrainVertex::STRIDE);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
    }
}
