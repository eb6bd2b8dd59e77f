// ============================================
// Chunk Streaming Manager - Видимость и LOD вокруг зрителя
// ============================================
// Главный поток: update() раз в тик забирает готовые результаты,
// а при смещении зрителя пересчитывает окно видимых чанков.
// Генерация карт, мешей и глобального поля идёт в GenerationQueue.

use std::collections::HashMap;
use std::sync::Arc;

use ultraviolet::Vec2;

use super::chunk::{LodMeshState, MapState, TerrainChunk};
use super::queue::{GenerationQueue, TaskKind};
use super::renderer::ChunkRenderer;
use crate::core::{TerrainConfig, TerrainError};
use crate::terrain::cache::ChunkCoord;
use crate::terrain::generation::{
    world_to_field, GlobalFieldSampler, HeightMap, MapData, MapGenerator, NormalizeMode,
};
use crate::terrain::lod::LodTable;
use crate::terrain::mesh::MeshData;

/// Счётчики запросов (для отладки и тестов)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamingStats {
    pub height_map_requests: usize,
    pub mesh_requests: usize,
    pub failed_tasks: usize,
}

pub struct ChunkStreamingManager<R: ChunkRenderer + 'static> {
    generator: Arc<MapGenerator>,
    lod_table: LodTable,
    chunk_size: f32,
    view_distance: f32,
    chunks_visible_in_view: i32,
    move_threshold_sq: f32,

    chunks: HashMap<ChunkCoord, TerrainChunk>,
    visible_last_update: Vec<ChunkCoord>,
    viewer: Vec2,
    viewer_at_last_update: Vec2,
    needs_update: bool,

    global: Option<GlobalFieldSampler>,
    global_requested: bool,

    queue: GenerationQueue<Self>,
    renderer: R,
    stats: StreamingStats,
}

impl<R: ChunkRenderer + 'static> ChunkStreamingManager<R> {
    /// Проверяет конфигурацию, поднимает пул и (в глобальном режиме)
    /// сразу ставит в очередь генерацию глобального поля.
    pub fn new(config: TerrainConfig, renderer: R) -> Result<Self, TerrainError> {
        config.validate()?;
        let lod_table = config.lod_table()?;
        let chunk_size = config.chunk_size();
        let view_distance = lod_table.view_distance();
        let chunks_visible_in_view = (view_distance / chunk_size).round() as i32;
        let threshold = config.streaming.viewer_move_threshold;
        let queue = GenerationQueue::new(config.streaming.worker_threads)?;
        let global_mode = config.noise.normalize_mode == NormalizeMode::Global;

        let mut manager = Self {
            generator: Arc::new(MapGenerator::new(Arc::new(config))),
            lod_table,
            chunk_size,
            view_distance,
            chunks_visible_in_view,
            move_threshold_sq: threshold * threshold,
            chunks: HashMap::new(),
            visible_last_update: Vec::new(),
            viewer: Vec2::zero(),
            viewer_at_last_update: Vec2::zero(),
            needs_update: true,
            global: None,
            global_requested: false,
            queue,
            renderer,
            stats: StreamingStats::default(),
        };
        if global_mode {
            manager.request_global_field();
        }
        Ok(manager)
    }

    /// Один тик главного цикла. `viewer` - проекция зрителя на плоскость XZ.
    pub fn update(&mut self, viewer: Vec2) {
        self.viewer = viewer;
        self.drain_completed();

        let moved = (viewer - self.viewer_at_last_update).mag_sq() > self.move_threshold_sq;
        if self.needs_update || moved {
            self.viewer_at_last_update = viewer;
            self.needs_update = false;
            self.update_visible_chunks();
        }
    }

    /// Вызвать колбэки всех завершённых задач
    pub fn drain_completed(&mut self) -> usize {
        let batch = self.queue.take_completed();
        let count = batch.len();
        for task in batch {
            task.complete(self);
        }
        count
    }

    /// Поставить в очередь генерацию глобального поля (повторно не ставится, пока идёт)
    pub fn request_global_field(&mut self) {
        if self.global_requested || self.global.is_some() {
            return;
        }
        self.global_requested = true;
        let generator = Arc::clone(&self.generator);
        self.queue.request(
            TaskKind::GlobalField,
            move || Ok(Arc::new(generator.generate_global_field())),
            |manager: &mut Self, result| manager.on_global_field_received(result),
        );
    }

    /// Подставить заранее посчитанное глобальное поле
    pub fn set_global_field(&mut self, field: HeightMap) {
        self.global = Some(self.generator.sampler_for(Arc::new(field)));
        self.needs_update = true;
        log::info!("Global noise field installed");
    }

    pub fn has_global_field(&self) -> bool {
        self.global.is_some()
    }

    /// Значение глобального поля в мировой точке (x, z).
    /// `None`, пока поле не готово.
    pub fn height_at(&self, world: Vec2) -> Option<f32> {
        self.global.as_ref().map(|g| g.sample_at(world_to_field(world)))
    }

    /// Высота поверхности в мировой точке (x, z), как у вершин меша
    pub fn terrain_height_at(&self, world: Vec2) -> Option<f32> {
        self.height_at(world).map(|v| self.generator.elevation(v))
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        &self.visible_last_update
    }

    /// Задачи, чьи колбэки ещё не вызваны
    pub fn pending_tasks(&self) -> usize {
        self.queue.in_flight()
    }

    pub fn stats(&self) -> StreamingStats {
        self.stats
    }

    pub fn view_distance(&self) -> f32 {
        self.view_distance
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    pub fn generator(&self) -> &MapGenerator {
        &self.generator
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    // ============================================
    // Visibility pass - Пересчёт окна видимости
    // ============================================

    fn update_visible_chunks(&mut self) {
        for coord in std::mem::take(&mut self.visible_last_update) {
            self.set_chunk_visible(coord, false);
        }

        let current = ChunkCoord::containing(self.viewer, self.chunk_size);
        let n = self.chunks_visible_in_view;
        for dz in -n..=n {
            for dx in -n..=n {
                let coord = current.offset(dx, dz);
                match self.chunks.get(&coord).map(|c| matches!(c.map, MapState::Absent)) {
                    Some(false) => {
                        if self.update_chunk(coord) {
                            self.visible_last_update.push(coord);
                        }
                    }
                    // Предыдущий запрос карты завершился ошибкой
                    Some(true) => self.request_map_data(coord),
                    None => {
                        let chunk = TerrainChunk::new(coord, self.chunk_size, self.lod_table.len());
                        self.chunks.insert(coord, chunk);
                        log::debug!("Created chunk {:?}", coord);
                        self.request_map_data(coord);
                    }
                }
            }
        }
    }

    /// Видимость и LOD одного чанка. Возвращает итоговую видимость.
    fn update_chunk(&mut self, coord: ChunkCoord) -> bool {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        let MapState::Ready(map) = &chunk.map else {
            return chunk.visible;
        };

        let distance = chunk.bounds().distance(self.viewer);
        let visible = distance <= self.view_distance;

        if visible {
            let lod_index = self.lod_table.select(distance);
            if chunk.active_lod != Some(lod_index) {
                match chunk.lod_meshes[lod_index].clone() {
                    LodMeshState::Ready(mesh) => {
                        chunk.active_lod = Some(lod_index);
                        let lod = self.lod_table.levels()[lod_index].lod;
                        self.renderer.present(coord, lod, mesh, Arc::clone(&map.color_map));
                    }
                    LodMeshState::Requested => {}
                    LodMeshState::Absent => {
                        let height_map = Arc::clone(&map.height_map);
                        chunk.lod_meshes[lod_index] = LodMeshState::Requested;
                        self.request_mesh(coord, lod_index, height_map);
                    }
                }
            }
        }

        self.set_chunk_visible(coord, visible);
        visible
    }

    fn set_chunk_visible(&mut self, coord: ChunkCoord, visible: bool) {
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            if chunk.visible != visible {
                chunk.visible = visible;
                self.renderer.set_visible(coord, visible);
            }
        }
    }

    // ============================================
    // Requests - Постановка задач в очередь
    // ============================================

    fn request_map_data(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        chunk.map = MapState::Requested;
        self.stats.height_map_requests += 1;

        let generator = Arc::clone(&self.generator);
        let global = self.global.clone();
        let center = coord.world_center(self.chunk_size);
        self.queue.request(
            TaskKind::HeightMap,
            move || generator.generate_map_data(center, global.as_ref()),
            move |manager: &mut Self, result| manager.on_map_data_received(coord, result),
        );
    }

    fn request_mesh(&mut self, coord: ChunkCoord, lod_index: usize, height_map: Arc<HeightMap>) {
        self.stats.mesh_requests += 1;
        let lod = self.lod_table.levels()[lod_index].lod;
        let generator = Arc::clone(&self.generator);
        self.queue.request(
            TaskKind::Mesh,
            move || Ok(generator.build_mesh(&height_map, lod)),
            move |manager: &mut Self, result| manager.on_mesh_received(coord, lod_index, result),
        );
    }

    // ============================================
    // Callbacks - Результаты из пула (главный поток)
    // ============================================

    fn on_map_data_received(&mut self, coord: ChunkCoord, result: Result<MapData, TerrainError>) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        match result {
            Ok(data) => {
                chunk.map = MapState::Ready(data);
                log::debug!("Map data ready for chunk {:?}", coord);
                self.refresh_chunk(coord);
            }
            Err(e) => {
                chunk.map = MapState::Absent;
                self.stats.failed_tasks += 1;
                log::warn!("Map data for chunk {:?} failed: {}", coord, e);
                // Запрос ушёл до прихода глобального поля: повторяем сразу,
                // остальные ошибки ждут следующего прохода видимости
                if matches!(e, TerrainError::GlobalFieldMissing) && self.global.is_some() {
                    self.request_map_data(coord);
                }
            }
        }
    }

    fn on_mesh_received(&mut self, coord: ChunkCoord, lod_index: usize, result: Result<MeshData, TerrainError>) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        match result {
            Ok(mesh) => {
                chunk.lod_meshes[lod_index] = LodMeshState::Ready(Arc::new(mesh));
                self.refresh_chunk(coord);
            }
            Err(e) => {
                chunk.lod_meshes[lod_index] = LodMeshState::Absent;
                self.stats.failed_tasks += 1;
                log::warn!("Mesh LOD index {} for chunk {:?} failed: {}", lod_index, coord, e);
            }
        }
    }

    fn on_global_field_received(&mut self, result: Result<Arc<HeightMap>, TerrainError>) {
        self.global_requested = false;
        match result {
            Ok(field) if self.global.is_none() => {
                self.global = Some(self.generator.sampler_for(field));
                self.needs_update = true;
                log::info!("Global noise field ready");
            }
            Ok(_) => log::debug!("Global noise field already installed, dropping generated one"),
            Err(e) => {
                self.stats.failed_tasks += 1;
                log::error!("Global noise field generation failed: {}", e);
            }
        }
    }

    /// Обновление чанка вне прохода видимости: видимый чанк попадает в список,
    /// чтобы следующий проход его спрятал
    fn refresh_chunk(&mut self, coord: ChunkCoord) {
        let visible = self.update_chunk(coord);
        let listed = self.visible_last_update.contains(&coord);
        if visible && !listed {
            self.visible_last_update.push(coord);
        } else if !visible && listed {
            self.visible_last_update.retain(|c| *c != coord);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generation::{ColorMap, NoiseSettings};
    use crate::terrain::lod::LodInfo;
    use std::collections::HashSet;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct RecordingRenderer {
        presented: Vec<(ChunkCoord, usize)>,
        visible: HashSet<ChunkCoord>,
    }

    impl ChunkRenderer for RecordingRenderer {
        fn present(&mut self, coord: ChunkCoord, lod: usize, _mesh: Arc<MeshData>, _texture: Arc<ColorMap>) {
            self.presented.push((coord, lod));
        }

        fn set_visible(&mut self, coord: ChunkCoord, visible: bool) {
            if visible {
                self.visible.insert(coord);
            } else {
                self.visible.remove(&coord);
            }
        }
    }

    /// Чанк 8x8 мировых единиц, порог движения 0 (пересчёт каждый тик)
    fn small_config(lod_levels: Vec<LodInfo>) -> TerrainConfig {
        let mut config = TerrainConfig::default();
        config.noise = NoiseSettings { seed: 11, octaves: 3, scale: 10.0, ..Default::default() };
        config.map.map_chunk_size = 9;
        config.map.global_field_size = 32;
        config.lod_levels = lod_levels;
        config.streaming.viewer_move_threshold = 0.0;
        config.streaming.worker_threads = 2;
        config
    }

    /// Тики до тех пор, пока все задачи не вернутся
    fn settle(manager: &mut ChunkStreamingManager<RecordingRenderer>, viewer: Vec2) {
        let deadline = Instant::now() + Duration::from_secs(20);
        manager.update(viewer);
        while manager.pending_tasks() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
            manager.update(viewer);
        }
        assert_eq!(manager.pending_tasks(), 0, "generation did not finish in time");
    }

    #[test]
    fn test_window_is_created_around_viewer() {
        let config = small_config(vec![LodInfo { lod: 0, visible_distance: 20.0 }]);
        let mut manager = ChunkStreamingManager::new(config, RecordingRenderer::default()).unwrap();
        settle(&mut manager, Vec2::zero());

        // round(20 / 8) = 3 -> окно 7x7
        assert_eq!(manager.chunk_count(), 49);
        assert_eq!(manager.stats().height_map_requests, 49);
        let origin = manager.chunk(ChunkCoord::new(0, 0)).unwrap();
        assert!(origin.is_visible());
        assert_eq!(origin.active_lod(), Some(0));
        assert!(manager.renderer().visible.contains(&ChunkCoord::new(0, 0)));
        // Угол окна дальше дальности видимости
        assert!(!manager.chunk(ChunkCoord::new(3, 3)).unwrap().is_visible());
        for coord in manager.visible_chunks() {
            assert!(manager.chunk(*coord).unwrap().is_visible());
        }
    }

    #[test]
    fn test_visibility_boundary_is_inclusive() {
        let config = small_config(vec![LodInfo { lod: 0, visible_distance: 20.0 }]);
        let mut manager = ChunkStreamingManager::new(config, RecordingRenderer::default()).unwrap();
        let edge = ChunkCoord::new(3, 0);

        // Ближний край чанка (3, 0) на x = 20
        settle(&mut manager, Vec2::zero());
        assert!(manager.chunk(edge).unwrap().is_visible());

        settle(&mut manager, Vec2::new(-0.5, 0.0));
        assert!(!manager.chunk(edge).unwrap().is_visible());
        assert!(!manager.renderer().visible.contains(&edge));

        settle(&mut manager, Vec2::new(0.5, 0.0));
        assert!(manager.chunk(edge).unwrap().is_visible());
        assert!(manager.renderer().visible.contains(&edge));
    }

    #[test]
    fn test_small_moves_do_not_recompute_window() {
        let mut config = small_config(vec![LodInfo { lod: 0, visible_distance: 16.0 }]);
        config.streaming.viewer_move_threshold = 25.0;
        let mut manager = ChunkStreamingManager::new(config, RecordingRenderer::default()).unwrap();

        // round(16 / 8) = 2 -> окно 5x5
        settle(&mut manager, Vec2::zero());
        assert_eq!(manager.chunk_count(), 25);
        let visible: Vec<ChunkCoord> = manager.visible_chunks().to_vec();

        // 24 < 25: окно остаётся прежним, хотя зритель уже в чанке (3, 0)
        settle(&mut manager, Vec2::new(24.0, 0.0));
        assert_eq!(manager.chunk_count(), 25);
        assert_eq!(manager.visible_chunks(), visible.as_slice());
        assert!(manager.chunk(ChunkCoord::new(0, 0)).unwrap().is_visible());

        // 25.5 > 25: окно смещается на три колонки
        settle(&mut manager, Vec2::new(25.5, 0.0));
        assert_eq!(manager.chunk_count(), 40);
        assert!(manager.chunk(ChunkCoord::new(5, 0)).unwrap().is_visible());
        assert!(!manager.chunk(ChunkCoord::new(-2, 0)).unwrap().is_visible());
    }

    #[test]
    fn test_lod_hysteresis_reuses_cached_meshes() {
        let config = small_config(vec![
            LodInfo { lod: 0, visible_distance: 6.0 },
            LodInfo { lod: 1, visible_distance: 20.0 },
        ]);
        let mut manager = ChunkStreamingManager::new(config, RecordingRenderer::default()).unwrap();
        let near = Vec2::new(0.0, 0.0);
        let far = Vec2::new(-3.0, 0.0);
        let probe = ChunkCoord::new(1, 0);

        settle(&mut manager, near);
        assert_eq!(manager.chunk(probe).unwrap().active_lod(), Some(0));
        settle(&mut manager, far);
        assert_eq!(manager.chunk(probe).unwrap().active_lod(), Some(1));

        let requests = manager.stats().mesh_requests;
        let chunks = manager.chunk_count();
        for _ in 0..3 {
            settle(&mut manager, near);
            assert_eq!(manager.chunk(probe).unwrap().active_lod(), Some(0));
            settle(&mut manager, far);
            assert_eq!(manager.chunk(probe).unwrap().active_lod(), Some(1));
        }
        assert_eq!(manager.stats().mesh_requests, requests);
        assert_eq!(manager.chunk_count(), chunks);

        let chunk = manager.chunk(probe).unwrap();
        assert!(chunk.lod_mesh(0).unwrap().is_ready());
        assert!(chunk.lod_mesh(1).unwrap().is_ready());
        let swaps = manager.renderer().presented.iter().filter(|(c, _)| *c == probe).count();
        assert_eq!(swaps, 8);
    }

    #[test]
    fn test_failed_map_data_is_requested_again() {
        let config = small_config(vec![LodInfo { lod: 0, visible_distance: 20.0 }]);
        let mut manager = ChunkStreamingManager::new(config, RecordingRenderer::default()).unwrap();
        settle(&mut manager, Vec2::zero());
        let before = manager.stats().height_map_requests;

        let coord = ChunkCoord::new(0, 0);
        manager.on_map_data_received(coord, Err(TerrainError::GlobalFieldMissing));
        assert!(!manager.chunk(coord).unwrap().has_map_data());
        assert_eq!(manager.stats().failed_tasks, 1);

        settle(&mut manager, Vec2::new(1.0, 0.0));
        assert_eq!(manager.stats().height_map_requests, before + 1);
        assert!(manager.chunk(coord).unwrap().has_map_data());
    }

    #[test]
    fn test_global_mode_streams_after_field_arrives() {
        let mut config = small_config(vec![LodInfo { lod: 0, visible_distance: 20.0 }]);
        config.noise.normalize_mode = NormalizeMode::Global;
        let mut manager = ChunkStreamingManager::new(config, RecordingRenderer::default()).unwrap();
        assert_eq!(manager.height_at(Vec2::zero()), None);

        // Поле приходит в одном из тиков, после этого окно пересчитывается само
        settle(&mut manager, Vec2::zero());
        assert!(manager.has_global_field());
        let origin = manager.chunk(ChunkCoord::new(0, 0)).unwrap();
        assert!(origin.is_visible());

        let value = manager.height_at(Vec2::new(3.0, -2.0)).unwrap();
        assert!((0.0..=1.0).contains(&value));
        let elevation = manager.terrain_height_at(Vec2::new(3.0, -2.0)).unwrap();
        assert!((elevation - manager.generator().elevation(value)).abs() < 1e-6);
    }

    #[test]
    fn test_injected_global_field_avoids_failures() {
        let mut config = small_config(vec![LodInfo { lod: 0, visible_distance: 20.0 }]);
        config.noise.normalize_mode = NormalizeMode::Global;
        let mut manager = ChunkStreamingManager::new(config, RecordingRenderer::default()).unwrap();
        let field = manager.generator().generate_global_field();
        manager.set_global_field(field);

        settle(&mut manager, Vec2::zero());
        assert_eq!(manager.stats().failed_tasks, 0);
        assert_eq!(manager.stats().height_map_requests, manager.chunk_count());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = small_config(Vec::new());
        assert!(matches!(
            ChunkStreamingManager::new(config, RecordingRenderer::default()),
            Err(TerrainError::InvalidConfig(_))
        ));
    }
}
