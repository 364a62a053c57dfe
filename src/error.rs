//! Error types for the forecasting pipeline

use thiserror::Error;

/// Errors that can occur while running the forecasting pipeline
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Malformed or missing hyperparameters, reported before any computation
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// The partition is too short for the requested window length
    #[error("insufficient data: {len} points, need more than {offset}")]
    InsufficientData { len: usize, offset: usize },

    /// Flat training series, min-max normalization is undefined
    #[error("degenerate value range: every training value equals {value}")]
    DegenerateRange { value: f64 },

    /// Training diverged; no partial report is produced
    #[error("non-finite loss {loss} at epoch {epoch}")]
    NonFiniteLoss { epoch: usize, loss: f64 },

    /// Prediction count does not match the validation actuals
    #[error("prediction alignment broken: expected {expected}, got {actual}")]
    Alignment { expected: usize, actual: usize },

    /// Invalid input series (unordered dates, non-finite values, empty)
    #[error("invalid series data: {message}")]
    Data { message: String },
}

impl ForecastError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        ForecastError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn data(message: impl Into<String>) -> Self {
        ForecastError::Data {
            message: message.into(),
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ForecastError>;
