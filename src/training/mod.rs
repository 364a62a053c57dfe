//! Model fitting: the epoch loop and its loss history

mod trainer;

pub use trainer::{EpochRecord, Trainer, TrainingHistory};
