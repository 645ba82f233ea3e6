//! Ошибки предметной области

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemandError>;

#[derive(Debug, Error)]
pub enum DemandError {
    /// Исторический датасет отсутствует или повреждён (фатально при старте)
    #[error("dataset unavailable: {0}")]
    DataUnavailable(String),

    /// Артефакт модели отсутствует или повреждён (фатально при старте)
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("feature schema mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("empty input: at least one row is required")]
    EmptyInput,

    #[error("target length mismatch: {rows} rows, {targets} targets")]
    TargetLengthMismatch { rows: usize, targets: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Модель вернула неприменимый результат (NaN, не то число строк)
    #[error("invalid model output: {0}")]
    InvalidModelOutput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Любой сбой внутри конвейера предсказания, с исходной причиной
    #[error("prediction failed: {source}")]
    PredictionFailed {
        #[source]
        source: Box<DemandError>,
    },
}

impl DemandError {
    pub fn prediction_failed(source: DemandError) -> Self {
        match source {
            // Не заворачиваем дважды
            already @ DemandError::PredictionFailed { .. } => already,
            other => DemandError::PredictionFailed {
                source: Box::new(other),
            },
        }
    }

    /// Ошибка запроса (а не конфигурации сервиса)
    pub fn is_client_error(&self) -> bool {
        match self {
            DemandError::InvalidInput(_) => true,
            DemandError::PredictionFailed { source } => source.is_client_error(),
            _ => false,
        }
    }
}
