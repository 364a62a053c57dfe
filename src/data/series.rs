//! Daily closing-price series and its chronological train/validation split

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observation: a trading day and its closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Ordered series of daily closing prices.
///
/// Dates are strictly increasing and every close is finite; the series is
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<PricePoint>,
}

impl TimeSeries {
    /// Builds a series from observations, validating ordering and values.
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(ForecastError::data("series is empty"));
        }

        for point in &points {
            if !point.close.is_finite() {
                return Err(ForecastError::data(format!(
                    "non-finite close {} at {}",
                    point.close, point.date
                )));
            }
        }

        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ForecastError::data(format!(
                    "dates not strictly increasing: {} then {}",
                    pair[0].date, pair[1].date
                )));
            }
        }

        Ok(Self { points })
    }

    /// Builds a series of consecutive calendar days starting at `start`.
    ///
    /// Convenient for synthetic data in drivers and tests.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}

/// Chronological train/validation split of a [`TimeSeries`].
///
/// `train` holds the first `(len * fraction) as usize` points, `valid` the
/// remainder; the two are contiguous, non-overlapping and order-preserving.
#[derive(Debug, Clone, Copy)]
pub struct Partition<'a> {
    pub train: &'a [PricePoint],
    pub valid: &'a [PricePoint],
}

impl<'a> Partition<'a> {
    /// Splits a series at `fraction` (0 < fraction < 1).
    pub fn split(series: &'a TimeSeries, fraction: f64) -> Result<Self> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ForecastError::config(format!(
                "train fraction must be in (0, 1), got {fraction}"
            )));
        }

        let tl = (series.len() as f64 * fraction) as usize;
        let (train, valid) = series.points().split_at(tl);
        Ok(Self { train, valid })
    }

    pub fn train_closes(&self) -> Vec<f64> {
        self.train.iter().map(|p| p.close).collect()
    }

    pub fn valid_closes(&self) -> Vec<f64> {
        self.valid.iter().map(|p| p.close).collect()
    }

    pub fn valid_dates(&self) -> Vec<NaiveDate> {
        self.valid.iter().map(|p| p.date).collect()
    }
}
