//! Recurrent predictor: configuration, layers, LSTM stack and optimizers
//!
//! ```rust
//! use stock_rnn::model::{ModelConfig, PricePredictor};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let spec = ModelConfig::default().validate().unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let predictor = PricePredictor::new(&spec.topology, &mut rng);
//! assert_eq!(predictor.depth(), 2);
//! ```

mod config;
mod layers;
mod lstm;
mod optimizer;

pub use config::{ModelConfig, ModelSpec, Topology};
pub use layers::Dense;
pub use lstm::{PredictorGradients, PricePredictor};
pub use optimizer::{Adam, Optimizer, Sgd};
