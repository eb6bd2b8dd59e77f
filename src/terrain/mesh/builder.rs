// ============================================
// Mesh Builder - Сетка высот -> меш с LOD
// ============================================
// LOD 0 - полное разрешение, каждый следующий уровень
// удваивает шаг прореживания: stride = lod * 2.

use ultraviolet::{Vec2, Vec3};

use crate::terrain::generation::{HeightCurve, HeightMap};

use super::data::MeshData;

/// Коэффициент сглаживания краёв по умолчанию
pub const DEFAULT_EDGE_SMOOTHING: f32 = 0.5;

/// Шаг прореживания сетки для уровня детализации
#[inline]
pub fn simplification_stride(lod: usize) -> usize {
    if lod == 0 { 1 } else { lod * 2 }
}

/// Число вершин на линию после прореживания
#[inline]
pub fn vertices_per_line(size: usize, lod: usize) -> usize {
    if size == 0 { 0 } else { (size - 1) / simplification_stride(lod) + 1 }
}

pub struct MeshBuilder;

impl MeshBuilder {
    /// Строит меш, центрированный в начале координат.
    /// Высота вершины = `clamp01(curve(h)) * height_multiplier`.
    pub fn build(
        height_map: &HeightMap,
        curve: &HeightCurve,
        height_multiplier: f32,
        lod: usize,
        edge_smoothing: f32,
    ) -> MeshData {
        let width = height_map.width();
        let height = height_map.height();
        let stride = simplification_stride(lod);
        let line_x = vertices_per_line(width, lod);
        let line_z = vertices_per_line(height, lod);

        let mut mesh = MeshData::with_grid(line_x, line_z);
        if line_x == 0 || line_z == 0 {
            return mesh;
        }

        let top_left_x = (width - 1) as f32 / -2.0;
        let top_left_z = (height - 1) as f32 / 2.0;

        for row in 0..line_z {
            let y = row * stride;
            for col in 0..line_x {
                let x = col * stride;
                let h = curve.evaluate(height_map.get(x, y)).clamp(0.0, 1.0) * height_multiplier;
                mesh.vertices.push(Vec3::new(top_left_x + x as f32, h, top_left_z - y as f32));
                mesh.uvs.push(Vec2::new(x as f32 / width as f32, y as f32 / height as f32));

                // Последние строка и столбец прореженной сетки треугольников не порождают
                if col + 1 < line_x && row + 1 < line_z {
                    let i = (row * line_x + col) as u32;
                    let next = line_x as u32;
                    mesh.add_triangle(i, i + next + 1, i + next);
                    mesh.add_triangle(i + next + 1, i, i + 1);
                }
            }
        }

        smooth_edges(&mut mesh, line_x, line_z, edge_smoothing);
        mesh
    }
}

/// Сглаживание высот вершин на четырёх краях сетки.
/// Каждая краевая вершина (кроме углов) смещается к среднему двух соседей
/// вдоль того же края. Соседи читаются из снимка до сглаживания.
/// В отличие от сглаживания только первой и последней строки, здесь
/// обрабатываются и обе крайние колонки: шов между чанками бывает по X и по Z.
fn smooth_edges(mesh: &mut MeshData, line_x: usize, line_z: usize, factor: f32) {
    let factor = factor.clamp(0.0, 1.0);
    if factor == 0.0 {
        return;
    }
    let heights: Vec<f32> = mesh.vertices.iter().map(|v| v.y).collect();
    let mut blend = |i: usize, prev: usize, next: usize| {
        let avg = (heights[prev] + heights[next]) * 0.5;
        let y = heights[i];
        mesh.vertices[i].y = y + (avg - y) * factor;
    };

    if line_x >= 3 {
        let last_row = (line_z - 1) * line_x;
        for col in 1..line_x - 1 {
            blend(col, col - 1, col + 1);
            if line_z > 1 {
                blend(last_row + col, last_row + col - 1, last_row + col + 1);
            }
        }
    }
    if line_z >= 3 {
        for row in 1..line_z - 1 {
            let left = row * line_x;
            blend(left, left - line_x, left + line_x);
            if line_x > 1 {
                let right = left + line_x - 1;
                blend(right, right - line_x, right + line_x);
            }
        }
    }
}
