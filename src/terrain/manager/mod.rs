mod chunk;
mod queue;
mod renderer;
mod streaming;

pub use chunk::{LodMeshState, MapState, TerrainChunk};
pub use queue::{CompletedTask, GenerationQueue, TaskId, TaskKind};
pub use renderer::{ChunkRenderer, NullRenderer};
pub use streaming::{ChunkStreamingManager, StreamingStats};
