// ============================================
// Global Field Sampler - Выборки из общего поля
// ============================================
// Одно большое поле шума делится между всеми чанками.
// Координаты оборачиваются по модулю размера поля (тор),
// значения между текселями берутся билинейно.

use std::sync::Arc;

use ultraviolet::Vec2;

use super::height_map::HeightMap;

/// Билинейный сэмплер поверх общего поля шума
#[derive(Debug, Clone)]
pub struct GlobalFieldSampler {
    field: Arc<HeightMap>,
    world_to_noise_scale: f32,
}

impl GlobalFieldSampler {
    pub fn new(field: Arc<HeightMap>, world_to_noise_scale: f32) -> Self {
        let world_to_noise_scale = if world_to_noise_scale > 0.0 && world_to_noise_scale.is_finite() {
            world_to_noise_scale
        } else {
            log::warn!("world_to_noise_scale {} is invalid, using 1", world_to_noise_scale);
            1.0
        };
        Self { field, world_to_noise_scale }
    }

    pub fn field(&self) -> &Arc<HeightMap> {
        &self.field
    }

    pub fn world_to_noise_scale(&self) -> f32 {
        self.world_to_noise_scale
    }

    /// Окно `size x size`: ячейка (x, y) берётся в точке `(offset + (x, y)) * scale`.
    /// Соседние окна с перекрытием в одну ячейку совпадают на общей границе.
    pub fn sample(&self, offset: Vec2, size: usize) -> HeightMap {
        if self.is_empty() {
            return HeightMap::new(size, size);
        }
        let scale = self.world_to_noise_scale as f64;
        let ox = offset.x as f64;
        let oy = offset.y as f64;
        HeightMap::from_fn(size, size, |x, y| {
            self.bilinear((ox + x as f64) * scale, (oy + y as f64) * scale)
        })
    }

    /// Значение поля в одной точке (та же интерполяция, что и в `sample`)
    pub fn sample_at(&self, position: Vec2) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let scale = self.world_to_noise_scale as f64;
        self.bilinear(position.x as f64 * scale, position.y as f64 * scale)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.field.width() == 0 || self.field.height() == 0
    }

    #[inline]
    fn bilinear(&self, u: f64, v: f64) -> f32 {
        let w = self.field.width() as i64;
        let h = self.field.height() as i64;

        let u0 = u.floor();
        let v0 = v.floor();
        let tx = (u - u0) as f32;
        let ty = (v - v0) as f32;

        let x0 = wrap(u0 as i64, w);
        let x1 = wrap(u0 as i64 + 1, w);
        let y0 = wrap(v0 as i64, h);
        let y1 = wrap(v0 as i64 + 1, h);

        let top = lerp(self.field.get(x0, y0), self.field.get(x1, y0), tx);
        let bottom = lerp(self.field.get(x0, y1), self.field.get(x1, y1), tx);
        lerp(top, bottom, ty)
    }
}

/// Индекс по модулю с коррекцией отрицательных значений
#[inline(always)]
fn wrap(i: i64, n: i64) -> usize {
    i.rem_euclid(n) as usize
}

#[inline(always)]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
