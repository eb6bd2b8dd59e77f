// ============================================
// Terrain Streamer Demo - Headless прогулка зрителя
// ============================================
// Использование: terrain_streamer [config.json]
// Уровень логов: RUST_LOG=info / RUST_LOG=debug

use std::sync::Arc;
use std::time::Duration;

use terrain_streamer::core::{TerrainConfig, TerrainError};
use terrain_streamer::terrain::generation::ColorMap;
use terrain_streamer::terrain::manager::{ChunkRenderer, ChunkStreamingManager};
use terrain_streamer::terrain::mesh::MeshData;
use terrain_streamer::terrain::ChunkCoord;
use ultraviolet::Vec2;

/// Количество тиков прогулки
const TICKS: usize = 240;
/// Шаг зрителя за тик (мировых единиц)
const VIEWER_SPEED: f32 = 12.0;

/// Рендерер, который только считает полученные меши
#[derive(Default)]
struct CountingRenderer {
    meshes: usize,
    vertices: usize,
    texture_bytes: usize,
}

impl ChunkRenderer for CountingRenderer {
    fn present(&mut self, coord: ChunkCoord, lod: usize, mesh: Arc<MeshData>, texture: Arc<ColorMap>) {
        self.meshes += 1;
        self.vertices += mesh.vertex_count();
        self.texture_bytes += texture.to_rgba8().len();
        log::debug!("Chunk {:?} shows LOD {} ({} triangles)", coord, lod, mesh.triangle_count());
    }

    fn set_visible(&mut self, coord: ChunkCoord, visible: bool) {
        log::trace!("Chunk {:?} visible = {}", coord, visible);
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), TerrainError> {
    let config = match std::env::args().nth(1) {
        Some(path) => TerrainConfig::load_from_file(path)?,
        None => TerrainConfig::default(),
    };

    println!("=== Terrain Streamer ===");
    println!("Seed: {}", config.noise.seed);
    println!("Normalize mode: {:?}", config.noise.normalize_mode);
    println!("Chunk size: {}", config.chunk_size());
    println!("========================");

    let mut manager = ChunkStreamingManager::new(config, CountingRenderer::default())?;

    // Зритель идёт по диагонали, каждый тик ~16 мс
    let mut viewer = Vec2::zero();
    for tick in 0..TICKS {
        manager.update(viewer);
        viewer += Vec2::new(VIEWER_SPEED, VIEWER_SPEED * 0.5);

        if tick % 60 == 0 {
            let height = manager
                .terrain_height_at(viewer)
                .map_or_else(|| "n/a".to_string(), |h| format!("{:.2}", h));
            log::info!(
                "tick {}: viewer ({:.0}, {:.0}) height {} | chunks {} visible {} pending {}",
                tick,
                viewer.x,
                viewer.y,
                height,
                manager.chunk_count(),
                manager.visible_chunks().len(),
                manager.pending_tasks(),
            );
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    // Дожидаемся хвоста фоновых задач
    while manager.pending_tasks() > 0 {
        manager.update(viewer);
        std::thread::sleep(Duration::from_millis(5));
    }

    let stats = manager.stats();
    let renderer = manager.renderer();
    println!("Chunks created:      {}", manager.chunk_count());
    println!("Visible chunks:      {}", manager.visible_chunks().len());
    println!("Height map requests: {}", stats.height_map_requests);
    println!("Mesh requests:       {}", stats.mesh_requests);
    println!("Failed tasks:        {}", stats.failed_tasks);
    println!("Meshes presented:    {}", renderer.meshes);
    println!("Vertices presented:  {}", renderer.vertices);
    println!("Texture bytes:       {}", renderer.texture_bytes);
    Ok(())
}
