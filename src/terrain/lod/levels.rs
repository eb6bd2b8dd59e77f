// ============================================
// LOD Levels - Уровни детализации
// ============================================

use serde::{Deserialize, Serialize};

/// Уровень детализации и дистанция, до которой он используется
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodInfo {
    /// Уровень прореживания меша (0 = полное разрешение)
    pub lod: usize,
    /// Дистанция до края чанка, до которой уровень активен
    pub visible_distance: f32,
}

impl LodInfo {
    pub const DEFAULT_LEVELS: [LodInfo; 3] = [
        LodInfo { lod: 0, visible_distance: 180.0 },
        LodInfo { lod: 2, visible_distance: 360.0 },
        LodInfo { lod: 4, visible_distance: 540.0 },
    ];
}

/// Упорядоченная (от ближнего к дальнему) таблица LOD
#[derive(Debug, Clone, PartialEq)]
pub struct LodTable {
    levels: Vec<LodInfo>,
}

impl LodTable {
    /// Таблица должна быть непустой, дистанции - неубывающими
    pub fn new(levels: Vec<LodInfo>) -> Option<Self> {
        if levels.is_empty() {
            return None;
        }
        let ascending = levels.windows(2).all(|w| w[0].visible_distance <= w[1].visible_distance);
        if !ascending {
            return None;
        }
        Some(Self { levels })
    }

    pub fn levels(&self) -> &[LodInfo] {
        &self.levels
    }

    /// Таблица никогда не пуста: `new` отвергает пустой список
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Дальность видимости = порог последнего уровня
    pub fn view_distance(&self) -> f32 {
        self.levels.last().map_or(0.0, |l| l.visible_distance)
    }

    /// Индекс первого уровня, чей порог >= дистанции.
    /// Дальше последнего порога остаётся последний уровень.
    pub fn select(&self, distance: f32) -> usize {
        self.levels
            .iter()
            .position(|l| distance <= l.visible_distance)
            .unwrap_or(self.levels.len().saturating_sub(1))
    }
}

impl Default for LodTable {
    fn default() -> Self {
        Self { levels: LodInfo::DEFAULT_LEVELS.to_vec() }
    }
}
