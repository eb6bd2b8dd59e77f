// ============================================
// Generation Module - Шум, высоты, цвета
// ============================================

mod color;
mod curve;
mod global;
mod height_map;
mod map;
mod noise;

pub use color::{Color, ColorMap, HeightfieldColorizer, TerrainType};
pub use curve::{CurveKey, HeightCurve};
pub use global::GlobalFieldSampler;
pub use height_map::HeightMap;
pub use map::{world_to_field, DrawMode, MapData, MapGenerator, Preview};
pub use self::noise::{octave_offsets, NoiseField, NoiseSettings, NormalizeMode, MIN_SCALE};
