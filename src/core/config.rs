// ============================================
// Terrain Config - Data-Driven из JSON
// ============================================
// Все параметры генерации и стриминга в одном месте.
// Каждая секция опциональна: отсутствующие поля берутся по умолчанию.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::TerrainError;
use crate::terrain::generation::{HeightCurve, NoiseSettings, TerrainType};
use crate::terrain::lod::{LodInfo, LodTable};
use crate::terrain::mesh::{simplification_stride, DEFAULT_EDGE_SMOOTHING};

/// Размер стороны карты высот чанка в вершинах (240 делится на 1..=12 шагов прореживания)
pub const DEFAULT_MAP_CHUNK_SIZE: usize = 241;

/// Размер стороны глобального поля
pub const DEFAULT_GLOBAL_FIELD_SIZE: usize = 2048;

/// Параметры карт высот и мешей
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub map_chunk_size: usize,
    /// Добавляется к каждой высоте перед раскраской и построением меша
    pub height_bias: f32,
    pub height_multiplier: f32,
    pub height_curve: HeightCurve,
    /// Мир -> индексы глобального поля
    pub world_to_noise_scale: f32,
    pub global_field_size: usize,
    pub edge_smoothing: f32,
    /// LOD для одиночного превью
    pub preview_lod: usize,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            map_chunk_size: DEFAULT_MAP_CHUNK_SIZE,
            height_bias: 0.0,
            height_multiplier: 30.0,
            height_curve: HeightCurve::default(),
            world_to_noise_scale: 1.0,
            global_field_size: DEFAULT_GLOBAL_FIELD_SIZE,
            edge_smoothing: DEFAULT_EDGE_SMOOTHING,
            preview_lod: 0,
        }
    }
}

/// Параметры стриминга чанков
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Пересчёт видимости только после смещения зрителя больше чем на это расстояние
    pub viewer_move_threshold: f32,
    /// Размер пула генерации (0 = число ядер)
    pub worker_threads: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self { viewer_move_threshold: 25.0, worker_threads: 0 }
    }
}

/// Полная конфигурация террейна
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub noise: NoiseSettings,
    pub map: MapSettings,
    pub terrain_types: Vec<TerrainType>,
    pub lod_levels: Vec<LodInfo>,
    pub streaming: StreamingSettings,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::default(),
            map: MapSettings::default(),
            terrain_types: TerrainType::default_palette(),
            lod_levels: LodInfo::DEFAULT_LEVELS.to_vec(),
            streaming: StreamingSettings::default(),
        }
    }
}

impl TerrainConfig {
    /// Загрузить конфигурацию из JSON строки
    pub fn load_from_json(json: &str) -> Result<Self, TerrainError> {
        let config: TerrainConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Загрузить конфигурацию из файла
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TerrainError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::load_from_json(&content)?;
        log::info!("Loaded terrain config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, TerrainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Размер чанка в мировых единицах (на одну вершину меньше стороны карты)
    #[inline]
    pub fn chunk_size(&self) -> f32 {
        self.map.map_chunk_size.saturating_sub(1) as f32
    }

    pub fn lod_table(&self) -> Result<LodTable, TerrainError> {
        LodTable::new(self.lod_levels.clone()).ok_or_else(|| {
            TerrainError::InvalidConfig(
                "lod_levels must be non-empty with ascending visible_distance".to_string(),
            )
        })
    }

    /// Проверка на границе: ошибки для неустранимых значений, предупреждения для остальных
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.map.map_chunk_size < 2 {
            return Err(TerrainError::InvalidConfig(format!(
                "map_chunk_size must be at least 2, got {}",
                self.map.map_chunk_size
            )));
        }
        if self.map.global_field_size == 0 {
            return Err(TerrainError::InvalidConfig("global_field_size must be positive".to_string()));
        }
        if !(self.streaming.viewer_move_threshold >= 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "viewer_move_threshold must be non-negative, got {}",
                self.streaming.viewer_move_threshold
            )));
        }
        let table = self.lod_table()?;
        if !(table.view_distance() > 0.0) {
            return Err(TerrainError::InvalidConfig("view distance must be positive".to_string()));
        }

        let cells = self.map.map_chunk_size - 1;
        for level in table.levels() {
            let stride = simplification_stride(level.lod);
            if cells % stride != 0 {
                log::warn!(
                    "LOD {} stride {} does not divide chunk size {}, chunk edges will not meet",
                    level.lod, stride, cells
                );
            }
        }
        match self.terrain_types.last() {
            Some(last) if last.height >= 1.0 => {}
            _ => log::warn!("Last terrain type threshold is below 1.0, some heights stay uncolored"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generation::NormalizeMode;

    #[test]
    fn test_default_config_is_valid() {
        let config = TerrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size(), 240.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "noise": { "seed": 99, "normalize_mode": "global" },
            "map": { "height_bias": 0.1 },
            "lod_levels": [
                { "lod": 0, "visible_distance": 100.0 },
                { "lod": 1, "visible_distance": 250.0 }
            ]
        }"#;
        let config = TerrainConfig::load_from_json(json).unwrap();
        assert_eq!(config.noise.seed, 99);
        assert_eq!(config.noise.normalize_mode, NormalizeMode::Global);
        assert_eq!(config.noise.octaves, NoiseSettings::default().octaves);
        assert_eq!(config.map.height_bias, 0.1);
        assert_eq!(config.map.map_chunk_size, DEFAULT_MAP_CHUNK_SIZE);
        assert_eq!(config.lod_table().unwrap().view_distance(), 250.0);
        assert_eq!(config.terrain_types, TerrainType::default_palette());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = TerrainConfig::default();
        let back = TerrainConfig::load_from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = TerrainConfig::default();
        config.lod_levels.clear();
        assert!(matches!(config.validate(), Err(TerrainError::InvalidConfig(_))));

        let mut config = TerrainConfig::default();
        config.map.map_chunk_size = 1;
        assert!(matches!(config.validate(), Err(TerrainError::InvalidConfig(_))));

        assert!(matches!(TerrainConfig::load_from_json("{ not json"), Err(TerrainError::Json(_))));
        assert!(matches!(
            TerrainConfig::load_from_file("/definitely/not/here.json"),
            Err(TerrainError::Io(_))
        ));
    }
}
