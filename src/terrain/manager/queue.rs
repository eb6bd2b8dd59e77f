// ============================================
// Generation Queue - Фоновая генерация с возвратом в главный поток
// ============================================
// Работа выполняется в ограниченном пуле rayon, готовые результаты
// складываются в общую очередь под мьютексом. Главный поток раз в тик
// забирает всю очередь целиком и вызывает колбэки уже без блокировки.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::core::TerrainError;

pub type TaskId = u64;

/// Вид фоновой задачи (для логов и статистики)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    GlobalField,
    HeightMap,
    Mesh,
}

type Callback<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Завершённая задача: результат уже захвачен колбэком
pub struct CompletedTask<C> {
    pub id: TaskId,
    pub kind: TaskKind,
    callback: Callback<C>,
}

impl<C> CompletedTask<C> {
    /// Передать результат владельцу. Вызывается ровно один раз.
    pub fn complete(self, ctx: &mut C) {
        (self.callback)(ctx)
    }
}

/// Очередь фоновой генерации для контекста `C`
pub struct GenerationQueue<C: 'static> {
    pool: ThreadPool,
    completed: Arc<Mutex<VecDeque<CompletedTask<C>>>>,
    /// Запрошено, но ещё не забрано главным потоком
    in_flight: Arc<AtomicUsize>,
    next_id: AtomicU64,
}

impl<C: 'static> GenerationQueue<C> {
    /// `worker_threads == 0` - размер пула по числу ядер
    pub fn new(worker_threads: usize) -> Result<Self, TerrainError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("terrain-gen-{}", i))
            .build()
            .map_err(|e| TerrainError::ThreadPool(e.to_string()))?;
        log::info!("Terrain generation pool started with {} threads", pool.current_num_threads());

        Ok(Self {
            pool,
            completed: Arc::new(Mutex::new(VecDeque::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicU64::new(0),
        })
    }

    /// Поставить задачу в пул. `on_complete` получит результат (или ошибку)
    /// в главном потоке при следующем `take_completed`/`drain`.
    pub fn request<T, W, F>(&self, kind: TaskKind, work: W, on_complete: F) -> TaskId
    where
        T: Send + 'static,
        W: FnOnce() -> Result<T, TerrainError> + Send + 'static,
        F: FnOnce(&mut C, Result<T, TerrainError>) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let completed = Arc::clone(&self.completed);
        self.in_flight.fetch_add(1, Ordering::AcqRel);

        self.pool.spawn(move || {
            let result = match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(result) => result,
                Err(payload) => Err(TerrainError::WorkerPanicked(panic_message(payload.as_ref()))),
            };
            if let Err(e) = &result {
                log::warn!("{:?} task {} failed: {}", kind, id, e);
            }

            let task = CompletedTask {
                id,
                kind,
                callback: Box::new(move |ctx: &mut C| on_complete(ctx, result)),
            };
            lock(&*completed).push_back(task);
        });
        id
    }

    /// Забрать все завершённые задачи (FIFO по завершению).
    /// Блокировка держится только на время обмена очереди.
    pub fn take_completed(&self) -> VecDeque<CompletedTask<C>> {
        let batch = std::mem::take(&mut *lock(&*self.completed));
        self.in_flight.fetch_sub(batch.len(), Ordering::AcqRel);
        batch
    }

    /// Забрать и сразу выполнить колбэки. Возвращает число задач.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let batch = self.take_completed();
        let count = batch.len();
        for task in batch {
            task.complete(ctx);
        }
        count
    }

    /// Задачи, чьи колбэки ещё не вызваны
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Паники перехватываются до push, поэтому очередь всегда целостна
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Крутит drain, пока всё не вернётся или не истечёт время
    fn drain_all<C: 'static>(queue: &GenerationQueue<C>, ctx: &mut C) -> usize {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut total = 0;
        while queue.in_flight() > 0 && Instant::now() < deadline {
            total += queue.drain(ctx);
            std::thread::sleep(Duration::from_millis(1));
        }
        total + queue.drain(ctx)
    }

    #[test]
    fn test_every_callback_fires_exactly_once() {
        let queue: GenerationQueue<Vec<usize>> = GenerationQueue::new(4).unwrap();
        for i in 0..100 {
            queue.request(
                TaskKind::HeightMap,
                move || Ok(i * 2),
                move |seen: &mut Vec<usize>, result| seen.push(result.unwrap() / 2),
            );
        }

        let mut seen = Vec::new();
        assert_eq!(drain_all(&queue, &mut seen), 100);
        assert_eq!(queue.in_flight(), 0);
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());

        // Повторный drain ничего не возвращает
        assert_eq!(queue.drain(&mut seen), 0);
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_concurrent_height_map_tasks_each_complete_once() {
        use crate::core::TerrainConfig;
        use crate::terrain::generation::{MapData, MapGenerator};
        use ultraviolet::Vec2;

        let mut config = TerrainConfig::default();
        config.map.map_chunk_size = 25;
        let generator = Arc::new(MapGenerator::new(Arc::new(config)));
        let queue: GenerationQueue<Vec<(usize, MapData)>> = GenerationQueue::new(4).unwrap();

        // 4 потока по 25 задач в одну очередь
        std::thread::scope(|scope| {
            for t in 0..4 {
                let queue = &queue;
                let generator = &generator;
                scope.spawn(move || {
                    for k in 0..25 {
                        let i = t * 25 + k;
                        let generator = Arc::clone(generator);
                        let center = Vec2::new(i as f32 * 24.0, 0.0);
                        queue.request(
                            TaskKind::HeightMap,
                            move || generator.generate_map_data(center, None),
                            move |done: &mut Vec<(usize, MapData)>, result| done.push((i, result.unwrap())),
                        );
                    }
                });
            }
        });

        let mut done = Vec::new();
        assert_eq!(drain_all(&queue, &mut done), 100);
        assert_eq!(queue.in_flight(), 0);
        let mut ids: Vec<usize> = done.iter().map(|(i, _)| *i).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..100).collect::<Vec<_>>());
        for (_, data) in &done {
            assert_eq!(data.height_map.width(), 25);
            assert!(data.height_map.values().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_errors_are_delivered() {
        let queue: GenerationQueue<Vec<String>> = GenerationQueue::new(1).unwrap();
        queue.request(
            TaskKind::HeightMap,
            || -> Result<(), TerrainError> { Err(TerrainError::GlobalFieldMissing) },
            |messages: &mut Vec<String>, result| messages.push(format!("{:?}", result.err())),
        );
        let mut messages = Vec::new();
        assert_eq!(drain_all(&queue, &mut messages), 1);
        assert_eq!(messages, vec!["Some(GlobalFieldMissing)".to_string()]);
    }

    #[test]
    fn test_worker_panic_becomes_error() {
        let queue: GenerationQueue<Option<TerrainError>> = GenerationQueue::new(2).unwrap();
        queue.request(
            TaskKind::Mesh,
            || -> Result<u32, TerrainError> { panic!("mesh exploded") },
            |slot: &mut Option<TerrainError>, result| *slot = result.err(),
        );
        let mut slot = None;
        assert_eq!(drain_all(&queue, &mut slot), 1);
        match slot {
            Some(TerrainError::WorkerPanicked(msg)) => assert!(msg.contains("mesh exploded")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_task_ids_are_unique() {
        let queue: GenerationQueue<()> = GenerationQueue::new(1).unwrap();
        let a = queue.request(TaskKind::Mesh, || Ok(()), |_: &mut (), _| {});
        let b = queue.request(TaskKind::Mesh, || Ok(()), |_: &mut (), _| {});
        assert_ne!(a, b);
        drain_all(&queue, &mut ());
        assert_eq!(queue.worker_count(), 1);
    }
}
