//! Min-max normalization fit on the training partition only

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Min-max scaler with a configurable target range (default [0, 1]).
///
/// `fit` must be called with training values only; the resulting
/// [`ScalingParams`] are then applied unchanged to the validation partition.
/// Refitting on validation data leaks future information into the scaling and
/// is a correctness defect, so the fitted state lives in a separate immutable
/// value rather than inside the scaler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self {
            feature_range: (0.0, 1.0),
        }
    }

    /// Sets a custom target range (default is [0, 1])
    pub fn with_range(mut self, low: f64, high: f64) -> Self {
        self.feature_range = (low, high);
        self
    }

    /// Computes min/max over the training values.
    ///
    /// Fails on empty or non-finite input, and with
    /// [`ForecastError::DegenerateRange`] when the series is flat (min == max),
    /// since the transform would divide by zero.
    pub fn fit(&self, train_values: &[f64]) -> Result<ScalingParams> {
        if train_values.is_empty() {
            return Err(ForecastError::data("cannot fit scaler on empty values"));
        }
        if let Some(&bad) = train_values.iter().find(|v| !v.is_finite()) {
            return Err(ForecastError::data(format!(
                "cannot fit scaler on non-finite value {bad}"
            )));
        }

        let data_min = train_values.iter().cloned().fold(f64::INFINITY, f64::min);
        let data_max = train_values
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);

        if data_min == data_max {
            return Err(ForecastError::DegenerateRange { value: data_min });
        }

        Ok(ScalingParams {
            data_min,
            data_max,
            feature_range: self.feature_range,
        })
    }
}

/// Fitted normalization parameters: train-partition min/max plus target range.
///
/// Read-only shared state; both the windower and the evaluator consume the
/// same instance fit once on the training partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub data_min: f64,
    pub data_max: f64,
    pub feature_range: (f64, f64),
}

impl ScalingParams {
    /// Maps values into the target range
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        let (low, high) = self.feature_range;
        let span = self.data_max - self.data_min;
        values
            .iter()
            .map(|v| (v - self.data_min) / span * (high - low) + low)
            .collect()
    }

    /// Exact algebraic inverse of [`transform`](Self::transform)
    pub fn inverse_transform(&self, scaled: &[f64]) -> Vec<f64> {
        let (low, high) = self.feature_range;
        let span = self.data_max - self.data_min;
        scaled
            .iter()
            .map(|s| (s - low) / (high - low) * span + self.data_min)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_transform_to_unit_range() {
        let params = MinMaxScaler::new().fit(&[10.0, 20.0, 30.0]).unwrap();
        let scaled = params.transform(&[10.0, 20.0, 30.0]);

        assert_abs_diff_eq!(scaled[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scaled[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(scaled[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip_is_identity() {
        let values: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64) * 3.7).collect();
        let params = MinMaxScaler::new().fit(&values).unwrap();

        let back = params.inverse_transform(&params.transform(&values));
        for (orig, rt) in values.iter().zip(back.iter()) {
            assert_abs_diff_eq!(orig, rt, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_custom_range() {
        let params = MinMaxScaler::new()
            .with_range(-1.0, 1.0)
            .fit(&[0.0, 10.0])
            .unwrap();
        let scaled = params.transform(&[0.0, 5.0, 10.0]);

        assert_abs_diff_eq!(scaled[0], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scaled[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scaled[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_valid_values_use_train_fit() {
        // values above the training max map above the top of the range,
        // they are never re-fit
        let params = MinMaxScaler::new().fit(&[0.0, 100.0]).unwrap();
        let scaled = params.transform(&[150.0]);
        assert_abs_diff_eq!(scaled[0], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_series_is_degenerate() {
        let err = MinMaxScaler::new().fit(&[5.0, 5.0, 5.0]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ForecastError::DegenerateRange { value } if value == 5.0
        ));
    }

    #[test]
    fn test_empty_and_non_finite_rejected() {
        assert!(MinMaxScaler::new().fit(&[]).is_err());
        assert!(MinMaxScaler::new().fit(&[1.0, f64::NAN]).is_err());
    }
}
