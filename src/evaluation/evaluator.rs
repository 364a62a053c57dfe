//! Scoring a trained predictor against the validation partition

use crate::error::{ForecastError, Result};
use crate::model::PricePredictor;
use crate::preprocessing::{ScalingParams, WindowedDataset};
use crate::utils::{r2_score, rmse};
use serde::{Deserialize, Serialize};

/// Validation metrics plus the per-point predictions in price units.
///
/// `predictions` is aligned by position with the validation partition: entry
/// `i` is the model's forecast for validation day `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub rmse: f64,
    pub r_squared: f64,
    pub predictions: Vec<f64>,
}

/// Predicts every validation window, inverse-scales through the train-fit
/// parameters and scores against the actual closing prices.
///
/// Pure with respect to its inputs: a new result is returned, nothing read is
/// mutated, and `params` is the same object fit once on the training
/// partition — never a refit. Fails with [`ForecastError::Alignment`] when
/// the window count does not match the actuals, which indicates a windowing
/// defect upstream.
pub fn evaluate(
    predictor: &PricePredictor,
    valid_windows: &WindowedDataset,
    params: &ScalingParams,
    valid_actuals: &[f64],
) -> Result<EvaluationResult> {
    let scaled: Vec<f64> = valid_windows
        .inputs
        .outer_iter()
        .map(|window| predictor.predict_window(window))
        .collect();

    let predictions = params.inverse_transform(&scaled);

    if predictions.len() != valid_actuals.len() {
        return Err(ForecastError::Alignment {
            expected: valid_actuals.len(),
            actual: predictions.len(),
        });
    }

    Ok(EvaluationResult {
        rmse: rmse(valid_actuals, &predictions),
        r_squared: r2_score(valid_actuals, &predictions),
        predictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PricePredictor, Topology};
    use crate::preprocessing::{make_windows, MinMaxScaler};
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiny_predictor() -> PricePredictor {
        let mut rng = StdRng::seed_from_u64(5);
        PricePredictor::new(
            &Topology::SingleLayer {
                units: 4,
                drop_rate: 0.0,
            },
            &mut rng,
        )
    }

    #[test]
    fn test_prediction_count_matches_actuals() {
        let scaled: Vec<f64> = (0..30).map(|i| i as f64 / 30.0).collect();
        let windows = make_windows(&scaled, 5).unwrap();
        let params = MinMaxScaler::new().fit(&[0.0, 30.0]).unwrap();
        let actuals = vec![10.0; windows.len()];

        let result = evaluate(&tiny_predictor(), &windows, &params, &actuals).unwrap();
        assert_eq!(result.predictions.len(), actuals.len());
        assert!(result.rmse.is_finite());
    }

    #[test]
    fn test_alignment_mismatch_is_an_error() {
        let scaled: Vec<f64> = (0..30).map(|i| i as f64 / 30.0).collect();
        let windows = make_windows(&scaled, 5).unwrap();
        let params = MinMaxScaler::new().fit(&[0.0, 30.0]).unwrap();
        let actuals = vec![10.0; windows.len() + 3];

        let err = evaluate(&tiny_predictor(), &windows, &params, &actuals).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::Alignment {
                expected: 28,
                actual: 25
            }
        ));
    }

    #[test]
    fn test_perfect_predictions_score_perfectly() {
        // actuals chosen so that inverse-scaled model output equals them is
        // not needed: score the metric path itself with identical series
        let actuals: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let params = MinMaxScaler::new().fit(&actuals).unwrap();

        // emulate a predictor that is exactly right by scoring actuals
        // against their own round trip through the scaler
        let round_trip = params.inverse_transform(&params.transform(&actuals));

        assert_abs_diff_eq!(rmse(&actuals, &round_trip), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r2_score(&actuals, &round_trip), 1.0, epsilon = 1e-9);
    }
}
