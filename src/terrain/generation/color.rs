// ============================================
// Terrain Colors - Цвета по высотным поясам
// ============================================

use serde::{Deserialize, Serialize};

use super::height_map::HeightMap;

/// RGBA цвет, компоненты в [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl Color {
    /// Цвет ячейки, не попавшей ни в один пояс
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::CLEAR
    }
}

/// Высотный пояс: всё, что `<= height`, окрашивается в `color`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainType {
    pub name: String,
    pub height: f32,
    pub color: Color,
}

impl TerrainType {
    pub fn new(name: impl Into<String>, height: f32, color: Color) -> Self {
        Self { name: name.into(), height, color }
    }

    /// Стандартный набор поясов: вода -> песок -> трава -> скалы -> снег
    pub fn default_palette() -> Vec<TerrainType> {
        vec![
            TerrainType::new("deep_water", 0.3, Color::rgb(0.20, 0.38, 0.76)),
            TerrainType::new("shallow_water", 0.4, Color::rgb(0.21, 0.40, 0.81)),
            TerrainType::new("sand", 0.45, Color::rgb(0.82, 0.82, 0.50)),
            TerrainType::new("grass", 0.55, Color::rgb(0.34, 0.60, 0.10)),
            TerrainType::new("forest", 0.6, Color::rgb(0.24, 0.42, 0.08)),
            TerrainType::new("rock", 0.7, Color::rgb(0.37, 0.27, 0.25)),
            TerrainType::new("high_rock", 0.9, Color::rgb(0.29, 0.24, 0.23)),
            TerrainType::new("snow", 1.0, Color::rgb(1.0, 1.0, 1.0)),
        ]
    }
}

/// Сетка цветов тех же размеров, что и исходная карта высот
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    width: usize,
    height: usize,
    colors: Vec<Color>,
}

impl ColorMap {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Color {
        self.colors[y * self.width + x]
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Серая текстура: 0 -> чёрный, 1 -> белый
    pub fn grayscale(height_map: &HeightMap) -> Self {
        let colors = height_map
            .values()
            .iter()
            .map(|&h| Color::BLACK.lerp(Color::WHITE, h))
            .collect();
        Self { width: height_map.width(), height: height_map.height(), colors }
    }

    /// Пиксели RGBA8 построчно для загрузки в текстуру
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| c.to_rgba8()).collect()
    }
}

/// Раскраска карты высот по упорядоченным поясам
pub struct HeightfieldColorizer;

impl HeightfieldColorizer {
    /// Первый пояс (в порядке массива) с `height >= h` задаёт цвет ячейки.
    /// Если ни один не подошёл, ячейка остаётся `Color::CLEAR`.
    pub fn colorize(height_map: &HeightMap, terrain_types: &[TerrainType]) -> ColorMap {
        let colors = height_map
            .values()
            .iter()
            .map(|&h| Self::color_for(h, terrain_types).unwrap_or(Color::CLEAR))
            .collect();
        ColorMap { width: height_map.width(), height: height_map.height(), colors }
    }

    #[inline]
    pub fn color_for(height: f32, terrain_types: &[TerrainType]) -> Option<Color> {
        terrain_types.iter().find(|t| height <= t.height).map(|t| t.color)
    }
}
