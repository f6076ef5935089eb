//! Crate-wide error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A record reached the temporal aggregator without a usable timestamp or label.
    #[error("invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// A streamed record is older than the one observed before it.
    #[error("input not sorted by timestamp at index {index}")]
    UnsortedInput { index: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
