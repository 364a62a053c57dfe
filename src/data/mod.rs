//! Input data types: the price series and its train/validation partition

mod series;

pub use series::{Partition, PricePoint, TimeSeries};
