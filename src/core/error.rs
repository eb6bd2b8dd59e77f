// ============================================
// Terrain Error - Ошибки генерации и стриминга
// ============================================

use std::fmt;

/// Ошибки конфигурации, генерации и фоновых задач
#[derive(Debug)]
pub enum TerrainError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Конфигурация не прошла проверку на границе
    InvalidConfig(String),
    /// Запрос в глобальном режиме пришёл раньше, чем готово глобальное поле
    GlobalFieldMissing,
    /// Не удалось создать пул потоков
    ThreadPool(String),
    /// Рабочая задача запаниковала, паника перехвачена в пуле
    WorkerPanicked(String),
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainError::Io(e) => write!(f, "I/O error: {}", e),
            TerrainError::Json(e) => write!(f, "JSON error: {}", e),
            TerrainError::InvalidConfig(msg) => write!(f, "invalid terrain config: {}", msg),
            TerrainError::GlobalFieldMissing => write!(f, "global noise field is not generated yet"),
            TerrainError::ThreadPool(msg) => write!(f, "failed to build worker pool: {}", msg),
            TerrainError::WorkerPanicked(msg) => write!(f, "generation worker panicked: {}", msg),
        }
    }
}

impl std::error::Error for TerrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerrainError::Io(e) => Some(e),
            TerrainError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TerrainError {
    fn from(e: std::io::Error) -> Self {
        TerrainError::Io(e)
    }
}

impl From<serde_json::Error> for TerrainError {
    fn from(e: serde_json::Error) -> Self {
        TerrainError::Json(e)
    }
}
