//! Training loop: shuffled mini-batches with per-epoch validation loss

use crate::error::{ForecastError, Result};
use crate::model::PricePredictor;
use crate::preprocessing::WindowedDataset;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Loss record for one completed epoch (epochs are numbered from 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub train_loss: f64,
    pub val_loss: f64,
}

/// Per-epoch loss history, appended to as training progresses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    records: Vec<EpochRecord>,
}

impl TrainingHistory {
    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.records.last().map(|r| r.val_loss)
    }
}

/// Runs the fitting loop for a [`PricePredictor`].
///
/// Every epoch is one full shuffled pass over the training windows in
/// mini-batches, followed by a validation-loss measurement that performs no
/// parameter updates. There is no early stopping; the configured epoch count
/// always runs to completion unless the loss turns non-finite.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub batch_size: usize,
    pub epochs: usize,
    grad_clip: Option<f64>,
    show_progress: bool,
}

impl Trainer {
    pub fn new(batch_size: usize, epochs: usize) -> Self {
        Self {
            batch_size,
            epochs,
            grad_clip: Some(1.0),
            show_progress: true,
        }
    }

    /// Sets per-entry gradient clamping (`None` disables it)
    pub fn with_grad_clip(mut self, clip: Option<f64>) -> Self {
        self.grad_clip = clip;
        self
    }

    /// Enables or disables the progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fits the predictor, returning the per-epoch loss history.
    ///
    /// Shuffling and dropout draw from `rng` only, so a fixed seed makes the
    /// whole run reproducible. Fails with [`ForecastError::NonFiniteLoss`]
    /// the first time the train or validation loss stops being finite.
    pub fn fit(
        &self,
        predictor: &mut PricePredictor,
        train: &WindowedDataset,
        valid: &WindowedDataset,
        rng: &mut StdRng,
    ) -> Result<TrainingHistory> {
        let n_samples = train.len();
        let batch_size = self.batch_size.min(n_samples);
        let mut history = TrainingHistory::default();

        let pb = if self.show_progress {
            let pb = ProgressBar::new(self.epochs as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) loss: {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut indices: Vec<usize> = (0..n_samples).collect();

        for epoch in 1..=self.epochs {
            indices.shuffle(rng);
            let mut squared_error_sum = 0.0;

            for batch in indices.chunks(batch_size) {
                let inv_batch = 1.0 / batch.len() as f64;
                let mut grads = predictor.zero_gradients();

                for &idx in batch {
                    squared_error_sum += predictor.backprop_window(
                        train.inputs.row(idx),
                        train.targets[idx],
                        inv_batch,
                        rng,
                        &mut grads,
                    );
                }

                if let Some(limit) = self.grad_clip {
                    grads.clamp(limit);
                }
                predictor.apply_gradients(&grads);
            }

            let train_loss = squared_error_sum / n_samples as f64;
            let val_loss = validation_loss(predictor, valid);

            if !train_loss.is_finite() {
                return Err(ForecastError::NonFiniteLoss {
                    epoch,
                    loss: train_loss,
                });
            }
            if !val_loss.is_finite() {
                return Err(ForecastError::NonFiniteLoss {
                    epoch,
                    loss: val_loss,
                });
            }

            debug!(epoch, train_loss, val_loss, "epoch complete");
            history.records.push(EpochRecord {
                epoch,
                train_loss,
                val_loss,
            });

            pb.set_message(format!("{train_loss:.6}"));
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(history)
    }
}

/// Mean squared error over a window set without updating parameters
fn validation_loss(predictor: &PricePredictor, valid: &WindowedDataset) -> f64 {
    let mut sum = 0.0;
    for (window, &target) in valid.inputs.outer_iter().zip(valid.targets.iter()) {
        let err = predictor.predict_window(window) - target;
        sum += err * err;
    }
    sum / valid.len() as f64
}
