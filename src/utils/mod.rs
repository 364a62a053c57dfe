//! Shared utilities: accuracy metrics

mod metrics;

pub use metrics::{mse, r2_score, rmse};
