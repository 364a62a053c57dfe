//! The full forecasting pipeline, from raw series to report

use crate::data::{Partition, TimeSeries};
use crate::error::Result;
use crate::evaluation::{evaluate, EvaluationResult};
use crate::model::{Adam, ModelConfig, PricePredictor};
use crate::preprocessing::{make_validation_windows, make_windows, MinMaxScaler};
use crate::report::{aggregate, Report};
use crate::training::{Trainer, TrainingHistory};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Knobs that sit outside the hyperparameter mapping
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Share of the series used for training (chronological split)
    pub train_fraction: f64,
    /// Learning rate of the Adam optimizer
    pub learning_rate: f64,
    /// Show the training progress bar
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            learning_rate: 0.01,
            show_progress: true,
        }
    }
}

/// Everything one pipeline run produces
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Configuration echoed together with `rms` and `r_squared`
    pub report: Report,
    /// Per-epoch train/validation loss, for loss-curve inspection
    pub history: TrainingHistory,
    /// Metrics plus per-point predictions aligned to the validation days
    pub evaluation: EvaluationResult,
}

/// Runs the pipeline with default options.
///
/// All randomness (weight init, epoch shuffling, dropout) derives from
/// `seed`, so identical inputs and seed give identical outputs.
pub fn run(series: &TimeSeries, config: &ModelConfig, seed: u64) -> Result<RunOutput> {
    run_with_options(series, config, seed, &PipelineOptions::default())
}

/// Runs the pipeline: split, scale, window, build, train, evaluate, report.
pub fn run_with_options(
    series: &TimeSeries,
    config: &ModelConfig,
    seed: u64,
    options: &PipelineOptions,
) -> Result<RunOutput> {
    let spec = config.validate()?;

    let partition = Partition::split(series, options.train_fraction)?;
    info!(
        train = partition.train.len(),
        valid = partition.valid.len(),
        "series partitioned"
    );

    // normalization is fit on the training partition only; the same
    // parameters are reused for the validation partition
    let train_closes = partition.train_closes();
    let valid_closes = partition.valid_closes();
    let params = MinMaxScaler::new().fit(&train_closes)?;

    let scaled_train = params.transform(&train_closes);
    let scaled_valid = params.transform(&valid_closes);

    let train_windows = make_windows(&scaled_train, spec.offset)?;
    let valid_windows = make_validation_windows(&scaled_train, &scaled_valid, spec.offset)?;
    info!(
        train_windows = train_windows.len(),
        valid_windows = valid_windows.len(),
        offset = spec.offset,
        "windows built"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let mut predictor = PricePredictor::new(&spec.topology, &mut rng);
    predictor.set_optimizer(Box::new(Adam::new(options.learning_rate)));
    info!(
        layers = predictor.depth(),
        parameters = predictor.num_parameters(),
        "predictor built"
    );

    let trainer = Trainer::new(spec.batch_size, spec.epochs).with_progress(options.show_progress);
    let history = trainer.fit(&mut predictor, &train_windows, &valid_windows, &mut rng)?;

    let evaluation = evaluate(&predictor, &valid_windows, &params, &valid_closes)?;
    info!(
        rmse = evaluation.rmse,
        r_squared = evaluation.r_squared,
        "evaluation complete"
    );

    let report = aggregate(config, &evaluation);

    Ok(RunOutput {
        report,
        history,
        evaluation,
    })
}
