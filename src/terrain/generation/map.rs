// ============================================
// Map Generator - Карты высот, цвета и меши чанков
// ============================================
// Соглашение о пространстве шума: мировая точка (x, z) -> точка поля (x, -z).
// Строки карты высот идут в ту же сторону, что и строки меша (z убывает),
// поэтому соседние чанки берут одинаковые выборки на общей границе.

use std::sync::Arc;

use ultraviolet::Vec2;

use super::color::{ColorMap, HeightfieldColorizer};
use super::global::GlobalFieldSampler;
use super::height_map::HeightMap;
use super::noise::{NoiseField, NormalizeMode};
use crate::core::{TerrainConfig, TerrainError};
use crate::terrain::mesh::{MeshBuilder, MeshData};

/// Режим одиночного превью
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    NoiseMap,
    ColorMap,
    Mesh,
}

/// Результат превью
#[derive(Debug, Clone)]
pub enum Preview {
    /// Серая текстура сырых высот
    NoiseMap(ColorMap),
    ColorMap(ColorMap),
    Mesh { mesh: MeshData, texture: ColorMap },
}

/// Высоты и цвета одного чанка
#[derive(Debug, Clone)]
pub struct MapData {
    pub height_map: Arc<HeightMap>,
    pub color_map: Arc<ColorMap>,
}

/// Мировая точка (x, z) в координатах поля шума
#[inline]
pub fn world_to_field(world: Vec2) -> Vec2 {
    Vec2::new(world.x, -world.y)
}

/// Чистые функции генерации поверх неизменяемой конфигурации.
/// Безопасно делится между потоками через `Arc`.
#[derive(Debug, Clone)]
pub struct MapGenerator {
    config: Arc<TerrainConfig>,
}

impl MapGenerator {
    pub fn new(config: Arc<TerrainConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Большое поле для глобального режима
    pub fn generate_global_field(&self) -> HeightMap {
        let size = self.config.map.global_field_size;
        log::info!("Generating global noise field {}x{}", size, size);
        NoiseField::generate(size, size, &self.config.noise, Vec2::zero(), NormalizeMode::Global)
    }

    pub fn sampler_for(&self, field: Arc<HeightMap>) -> GlobalFieldSampler {
        GlobalFieldSampler::new(field, self.config.map.world_to_noise_scale)
    }

    /// Карта высот чанка с центром в мировой точке `center` (x, z).
    /// В глобальном режиме без поля возвращает `GlobalFieldMissing`.
    pub fn generate_height_map(
        &self,
        center: Vec2,
        global: Option<&GlobalFieldSampler>,
    ) -> Result<HeightMap, TerrainError> {
        let size = self.config.map.map_chunk_size;
        let origin = world_to_field(center);
        let mut height_map = match self.config.noise.normalize_mode {
            NormalizeMode::Global => {
                let sampler = global.ok_or(TerrainError::GlobalFieldMissing)?;
                let half = (size.saturating_sub(1) / 2) as f32;
                sampler.sample(Vec2::new(origin.x - half, origin.y - half), size)
            }
            NormalizeMode::Local => {
                NoiseField::generate(size, size, &self.config.noise, origin, NormalizeMode::Local)
            }
        };
        height_map.apply_height_bias(self.config.map.height_bias);
        Ok(height_map)
    }

    /// Высоты + раскраска по поясам
    pub fn generate_map_data(
        &self,
        center: Vec2,
        global: Option<&GlobalFieldSampler>,
    ) -> Result<MapData, TerrainError> {
        let height_map = self.generate_height_map(center, global)?;
        let color_map = HeightfieldColorizer::colorize(&height_map, &self.config.terrain_types);
        Ok(MapData { height_map: Arc::new(height_map), color_map: Arc::new(color_map) })
    }

    pub fn build_mesh(&self, height_map: &HeightMap, lod: usize) -> MeshData {
        let map = &self.config.map;
        MeshBuilder::build(height_map, &map.height_curve, map.height_multiplier, lod, map.edge_smoothing)
    }

    /// Высота поверхности для значения поля: та же формула, что у вершин меша
    pub fn elevation(&self, noise_value: f32) -> f32 {
        let map = &self.config.map;
        let biased = (noise_value + map.height_bias).clamp(0.0, 1.0);
        map.height_curve.evaluate(biased).clamp(0.0, 1.0) * map.height_multiplier
    }

    /// Одиночный чанк в начале координат с локальной нормализацией
    pub fn preview(&self, mode: DrawMode) -> Preview {
        let size = self.config.map.map_chunk_size;
        let mut height_map =
            NoiseField::generate(size, size, &self.config.noise, Vec2::zero(), NormalizeMode::Local);
        height_map.apply_height_bias(self.config.map.height_bias);

        match mode {
            DrawMode::NoiseMap => Preview::NoiseMap(ColorMap::grayscale(&height_map)),
            DrawMode::ColorMap => {
                Preview::ColorMap(HeightfieldColorizer::colorize(&height_map, &self.config.terrain_types))
            }
            DrawMode::Mesh => Preview::Mesh {
                mesh: self.build_mesh(&height_map, self.config.map.preview_lod),
                texture: HeightfieldColorizer::colorize(&height_map, &self.config.terrain_types),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generation::NoiseSettings;

    fn config(mode: NormalizeMode) -> TerrainConfig {
        let mut config = TerrainConfig::default();
        config.noise = NoiseSettings { seed: 5, octaves: 3, normalize_mode: mode, ..Default::default() };
        config.map.map_chunk_size = 17;
        config.map.global_field_size = 64;
        config
    }

    #[test]
    fn test_global_mode_requires_field() {
        let generator = MapGenerator::new(Arc::new(config(NormalizeMode::Global)));
        assert!(matches!(
            generator.generate_map_data(Vec2::zero(), None),
            Err(TerrainError::GlobalFieldMissing)
        ));
    }

    #[test]
    fn test_adjacent_global_chunks_share_borders() {
        let generator = MapGenerator::new(Arc::new(config(NormalizeMode::Global)));
        let sampler = generator.sampler_for(Arc::new(generator.generate_global_field()));
        let chunk = generator.config().chunk_size();
        let n = generator.config().map.map_chunk_size;

        let origin = generator.generate_height_map(Vec2::zero(), Some(&sampler)).unwrap();
        let east = generator.generate_height_map(Vec2::new(chunk, 0.0), Some(&sampler)).unwrap();
        let north = generator.generate_height_map(Vec2::new(0.0, chunk), Some(&sampler)).unwrap();
        for i in 0..n {
            assert_eq!(origin.get(n - 1, i), east.get(0, i));
            // Север (+z) - это строка 0 меша, т.е. верхний край карты
            assert_eq!(origin.get(i, 0), north.get(i, n - 1));
        }
    }

    #[test]
    fn test_height_bias_is_applied() {
        let mut cfg = config(NormalizeMode::Local);
        cfg.map.height_bias = 2.0;
        let generator = MapGenerator::new(Arc::new(cfg));
        let data = generator.generate_map_data(Vec2::new(40.0, 40.0), None).unwrap();
        assert!(data.height_map.values().iter().all(|&v| v == 1.0));
        assert_eq!(data.color_map.width(), 17);
    }

    #[test]
    fn test_elevation_matches_mesh_height() {
        let generator = MapGenerator::new(Arc::new(config(NormalizeMode::Local)));
        let mesh = generator.build_mesh(&HeightMap::filled(3, 3, 0.4), 0);
        assert!((mesh.vertices[4].y - generator.elevation(0.4)).abs() < 1e-5);
    }

    #[test]
    fn test_preview_modes() {
        let generator = MapGenerator::new(Arc::new(config(NormalizeMode::Global)));
        match generator.preview(DrawMode::NoiseMap) {
            Preview::NoiseMap(texture) => assert_eq!(texture.colors().len(), 17 * 17),
            other => panic!("unexpected preview {:?}", other),
        }
        match generator.preview(DrawMode::Mesh) {
            Preview::Mesh { mesh, texture } => {
                assert_eq!(mesh.vertices.len(), 17 * 17);
                assert_eq!(texture.width(), 17);
            }
            other => panic!("unexpected preview {:?}", other),
        }
    }
}
