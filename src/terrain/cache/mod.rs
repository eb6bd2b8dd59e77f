mod chunk_key;

pub use chunk_key::{Bounds2, ChunkCoord};
