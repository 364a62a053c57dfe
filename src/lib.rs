//! # Stock RNN — LSTM forecasting for daily closing prices
//!
//! Univariate forecasting pipeline: a history window of scaled closing prices
//! goes in, the next day's price comes out, and the run is scored with RMSE
//! and R² on a chronological validation split.
//!
//! ## Modules
//!
//! - `data` - Price series and its train/validation partition
//! - `preprocessing` - Min-max scaling and supervised window construction
//! - `model` - Configurable stacked LSTM predictor and optimizers
//! - `training` - Epoch loop with per-epoch loss history
//! - `evaluation` - Metrics on inverse-scaled predictions
//! - `report` - Parameter/metric record for one run
//! - `pipeline` - End-to-end wiring with one seeded RNG
//! - `utils` - Shared accuracy metrics
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use stock_rnn::data::TimeSeries;
//! use stock_rnn::model::ModelConfig;
//! use stock_rnn::pipeline;
//!
//! fn main() -> anyhow::Result<()> {
//!     // 1. Series acquisition is the caller's job
//!     let closes: Vec<f64> = (0..500).map(|i| 1000.0 + (i as f64).sin() * 40.0).collect();
//!     let start = NaiveDate::from_ymd_opt(2015, 4, 1).unwrap();
//!     let series = TimeSeries::from_closes(start, &closes)?;
//!
//!     // 2. Hyperparameters: units_2 = 0 would select a single LSTM layer
//!     let config = ModelConfig::default();
//!
//!     // 3. Split, scale, window, train, evaluate
//!     let output = pipeline::run(&series, &config, 1234)?;
//!     println!("{}", output.report);
//!
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod training;
pub mod utils;

// Re-export the main types for convenience
pub use data::{Partition, PricePoint, TimeSeries};
pub use error::{ForecastError, Result};
pub use evaluation::{evaluate, EvaluationResult};
pub use model::{ModelConfig, PricePredictor, Topology};
pub use pipeline::{run, PipelineOptions, RunOutput};
pub use preprocessing::{MinMaxScaler, ScalingParams, WindowedDataset};
pub use report::{aggregate, Report};
pub use training::{Trainer, TrainingHistory};
