//! Data preparation: normalization and supervised window construction
//!
//! Scaling parameters are fit on the training partition only and then applied
//! unchanged to the validation partition.
//!
//! ```rust
//! use stock_rnn::preprocessing::{make_windows, MinMaxScaler};
//!
//! let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
//!
//! let params = MinMaxScaler::new().fit(&closes).unwrap();
//! let scaled = params.transform(&closes);
//!
//! // 10 history steps in, the next value out
//! let dataset = make_windows(&scaled, 10).unwrap();
//! assert_eq!(dataset.len(), 40);
//! ```

mod scaler;
mod windows;

pub use scaler::{MinMaxScaler, ScalingParams};
pub use windows::{make_validation_windows, make_windows, WindowedDataset};
