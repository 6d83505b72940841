//! Error types for the diarisk crate

use thiserror::Error;

/// Result type alias for diarisk operations
pub type Result<T> = std::result::Result<T, DiariskError>;

/// Main error type for the diarisk crate
#[derive(Error, Debug)]
pub enum DiariskError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Scenario {0} is not configured: {1}")]
    NotConfigured(String, String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for DiariskError {
    fn from(err: polars::error::PolarsError) -> Self {
        DiariskError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for DiariskError {
    fn from(err: serde_json::Error) -> Self {
        DiariskError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DiariskError {
    fn from(err: ndarray::ShapeError) -> Self {
        DiariskError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
