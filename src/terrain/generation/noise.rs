// ============================================
// Noise Field - Фрактальный шум по октавам
// ============================================
// Сумма октав Perlin шума с нормализацией в [0, 1].
// Local  - по собственным min/max сетки (только для превью, швы между чанками)
// Global - по теоретической границе, одинаковой для всех выборок одного поля

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

use super::height_map::HeightMap;

/// Минимальный масштаб шума (защита от деления на ноль)
pub const MIN_SCALE: f32 = 0.0001;

/// Диапазон случайных смещений октав
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Режим нормализации суммы октав
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    #[default]
    Local,
    Global,
}

/// Параметры фрактального шума
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub seed: i32,
    pub scale: f32,
    pub octaves: i32,
    /// Затухание амплитуды на каждую октаву
    pub persistence: f32,
    /// Рост частоты на каждую октаву
    pub lacunarity: f32,
    /// Глобальное смещение всего поля
    pub offset: [f32; 2],
    pub normalize_mode: NormalizeMode,
    /// Контраст глобальной нормализации: `0.5 + c * v / (2 * max_possible)`.
    /// `None` - c = 1, поле точно отображает `[-max, max]` в `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_calibration: Option<f32>,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0, 0.0],
            normalize_mode: NormalizeMode::Local,
            global_calibration: None,
        }
    }
}

impl NoiseSettings {
    /// Копия с зажатыми в допустимые пределы параметрами.
    /// Вызывается на границе, до горячего цикла.
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();
        if !(s.scale > 0.0) {
            log::warn!("Noise scale {} is not positive, clamping to {}", s.scale, MIN_SCALE);
            s.scale = MIN_SCALE;
        }
        if !(s.lacunarity >= 1.0) {
            log::warn!("Noise lacunarity {} < 1, clamping to 1", s.lacunarity);
            s.lacunarity = 1.0;
        }
        if s.octaves < 0 {
            log::warn!("Noise octaves {} < 0, clamping to 0", s.octaves);
            s.octaves = 0;
        }
        if !(s.persistence >= 0.0) {
            log::warn!("Noise persistence {} < 0, clamping to 0", s.persistence);
            s.persistence = 0.0;
        }
        if let Some(c) = s.global_calibration {
            if !(c > 0.0) {
                log::warn!("Global calibration {} is not positive, using analytic bound", c);
                s.global_calibration = None;
            }
        }
        s
    }

    #[inline]
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.offset[0], self.offset[1])
    }

    /// Максимально возможная сумма амплитуд (геометрический ряд persistence^i)
    pub fn max_possible_height(&self) -> f32 {
        let mut amplitude = 1.0;
        let mut total = 0.0;
        for _ in 0..self.octaves.max(0) {
            total += amplitude;
            amplitude *= self.persistence;
        }
        total
    }

    /// Глобальная нормализация одного значения суммы октав.
    /// Центр 0.5 не зависит от числа октав и persistence.
    #[inline]
    pub fn normalize_global(&self, v: f32) -> f32 {
        let max = self.max_possible_height();
        if max <= 0.0 {
            return 0.0;
        }
        let contrast = self.global_calibration.unwrap_or(1.0);
        (0.5 + contrast * v / (2.0 * max)).clamp(0.0, 1.0)
    }
}

/// Детерминированные смещения октав: seed -> ChaCha8 + общее смещение
pub fn octave_offsets(seed: i32, octaves: usize, offset: Vec2) -> Vec<Vec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as i64 as u64);
    (0..octaves)
        .map(|_| {
            let ox = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 + offset.x;
            let oy = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 + offset.y;
            Vec2::new(ox, oy)
        })
        .collect()
}

/// Базовый примитив: непрерывный 2D шум в [0, 1]
#[inline(always)]
fn base_noise(perlin: &Perlin, x: f64, y: f64) -> f32 {
    let v = perlin.get([x, y]) as f32;
    ((v + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Генератор фрактального поля
pub struct NoiseField;

impl NoiseField {
    /// Генерирует сетку `width x height` значений в [0, 1].
    /// `offset` добавляется к `settings.offset` (позиция чанка в мире).
    pub fn generate(
        width: usize,
        height: usize,
        settings: &NoiseSettings,
        offset: Vec2,
        mode: NormalizeMode,
    ) -> HeightMap {
        let s = settings.sanitized();
        let octaves = s.octaves as usize;
        if width == 0 || height == 0 || octaves == 0 {
            return HeightMap::new(width, height);
        }

        let offsets = octave_offsets(s.seed, octaves, s.offset() + offset);
        let perlin = Perlin::new(s.seed as u32);
        let half_width = width as f64 / 2.0;
        let half_height = height as f64 / 2.0;
        let scale = s.scale as f64;
        let persistence = s.persistence as f64;
        let lacunarity = s.lacunarity as f64;

        let mut values = vec![0.0f32; width * height];
        values.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let mut amplitude = 1.0f64;
                let mut frequency = 1.0f64;
                let mut sum = 0.0f64;

                for o in &offsets {
                    let sx = (x as f64 - half_width + o.x as f64) / scale * frequency;
                    let sy = (y as f64 - half_height + o.y as f64) / scale * frequency;
                    let n = base_noise(&perlin, sx, sy) as f64 * 2.0 - 1.0;
                    sum += n * amplitude;

                    amplitude *= persistence;
                    frequency *= lacunarity;
                }
                *cell = sum as f32;
            }
        });

        let (min, max) = values
            .par_iter()
            .fold(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |(lo, hi), &v| (lo.min(v), hi.max(v)),
            )
            .reduce(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |(a_lo, a_hi), (b_lo, b_hi)| (a_lo.min(b_lo), a_hi.max(b_hi)),
            );

        match mode {
            NormalizeMode::Local => {
                let range = max - min;
                for v in &mut values {
                    *v = if range == 0.0 { 0.0 } else { ((*v - min) / range).clamp(0.0, 1.0) };
                }
            }
            NormalizeMode::Global => {
                for v in &mut values {
                    *v = s.normalize_global(*v);
                }
            }
        }

        HeightMap::from_values(width, height, values)
    }
}
