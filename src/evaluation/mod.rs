//! Prediction scoring against the validation partition

mod evaluator;

pub use evaluator::{evaluate, EvaluationResult};
