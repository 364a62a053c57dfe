//! Run the forecasting pipeline on a closing-price series
//!
//! Usage: cargo run --bin forecast -- --csv GOOG.csv --config params.json

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use std::fs::File;
use std::path::Path;
use stock_rnn::data::{PricePoint, TimeSeries};
use stock_rnn::model::ModelConfig;
use stock_rnn::pipeline::{run_with_options, PipelineOptions};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut csv_path: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut predictions_path: Option<String> = None;
    let mut synthetic_days = 500usize;
    let mut seed = 1234u64;
    let mut learning_rate = 0.01f64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--csv" | "-c" => {
                csv_path = args.get(i + 1).cloned();
                i += 2;
            }
            "--config" => {
                config_path = args.get(i + 1).cloned();
                i += 2;
            }
            "--predictions" | "-p" => {
                predictions_path = args.get(i + 1).cloned();
                i += 2;
            }
            "--synthetic" => {
                synthetic_days = args
                    .get(i + 1)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(synthetic_days);
                i += 2;
            }
            "--seed" | "-s" => {
                seed = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(seed);
                i += 2;
            }
            "--lr" => {
                learning_rate = args
                    .get(i + 1)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(learning_rate);
                i += 2;
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                i += 1;
            }
        }
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("        Stock RNN - LSTM closing-price forecasting");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    // Load the series: a CSV of date,close rows, or a synthetic walk
    let series = match &csv_path {
        Some(path) => {
            println!("Loading series from {path}...");
            load_series_csv(path)?
        }
        None => {
            println!("No --csv given, generating {synthetic_days} synthetic days...");
            synthetic_series(synthetic_days, seed)?
        }
    };
    println!("Loaded {} daily closes", series.len());

    let config = match &config_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config {path}"))?;
            ModelConfig::from_json(&json)?
        }
        None => ModelConfig::default(),
    };

    println!("\nHyperparameters:");
    println!("  offset:      {}", config.offset);
    println!("  units_1:     {}", config.units_1);
    println!("  drop_rate_1: {}", config.drop_rate_1);
    println!("  units_2:     {}", config.units_2);
    if let Some(drop_rate_2) = config.drop_rate_2 {
        println!("  drop_rate_2: {drop_rate_2}");
    }
    println!("  batch_size:  {}", config.batch_size);
    println!("  epochs:      {}", config.epochs);
    println!();

    let options = PipelineOptions {
        learning_rate,
        ..PipelineOptions::default()
    };

    println!("Training ({} epochs)...", config.epochs);
    println!("─────────────────────────────────────────────────────────────────");
    let output = run_with_options(&series, &config, seed, &options)?;
    println!("─────────────────────────────────────────────────────────────────");

    println!("\nLoss curve (first/last epochs):");
    let records = output.history.records();
    for record in records.iter().take(3) {
        println!(
            "  epoch {:>3}: train {:.6}  valid {:.6}",
            record.epoch, record.train_loss, record.val_loss
        );
    }
    if records.len() > 6 {
        println!("  ...");
    }
    let tail_start = records.len().min(records.len().saturating_sub(3).max(3));
    for record in &records[tail_start..] {
        println!(
            "  epoch {:>3}: train {:.6}  valid {:.6}",
            record.epoch, record.train_loss, record.val_loss
        );
    }

    println!("\nReport:");
    print!("{}", output.report);

    if let Some(path) = predictions_path {
        save_predictions_csv(&path, &series, &output.evaluation.predictions)?;
        println!("\nPredictions saved to {path}");
    }

    Ok(())
}

/// Reads a `date,close` CSV (header required, ISO dates)
fn load_series_csv(path: &str) -> Result<TimeSeries> {
    let file = File::open(path).with_context(|| format!("cannot open {path}"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        let date: NaiveDate = record
            .get(0)
            .context("missing date column")?
            .parse()
            .context("unparseable date")?;
        let close: f64 = record
            .get(1)
            .context("missing close column")?
            .parse()
            .context("unparseable close")?;
        points.push(PricePoint::new(date, close));
    }

    Ok(TimeSeries::new(points)?)
}

/// Trending random walk, for demonstration without a data file
fn synthetic_series(days: usize, seed: u64) -> Result<TimeSeries> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0f64;
    let mut closes = Vec::with_capacity(days);

    for _ in 0..days {
        let change = 0.001 + (rng.gen::<f64>() - 0.5) * 0.02;
        price = (price * (1.0 + change)).max(1.0);
        closes.push(price);
    }

    let start = NaiveDate::from_ymd_opt(2015, 4, 1).expect("valid date");
    Ok(TimeSeries::from_closes(start, &closes)?)
}

/// Writes validation-day predictions next to the actual closes
fn save_predictions_csv(path: &str, series: &TimeSeries, predictions: &[f64]) -> Result<()> {
    let valid_start = series.len() - predictions.len();
    let valid_points = &series.points()[valid_start..];

    let mut writer = csv::Writer::from_path(Path::new(path))?;
    writer.write_record(["date", "close", "predicted"])?;
    for (point, predicted) in valid_points.iter().zip(predictions) {
        writer.write_record([
            point.date.to_string(),
            point.close.to_string(),
            predicted.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

fn print_help() {
    println!("Run the LSTM closing-price forecasting pipeline");
    println!();
    println!("USAGE:");
    println!("    cargo run --bin forecast -- [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --csv <PATH>          date,close CSV to forecast");
    println!("        --config <PATH>       JSON hyperparameter mapping");
    println!("    -p, --predictions <PATH>  write validation predictions CSV");
    println!("        --synthetic <DAYS>    synthetic series length (no --csv)");
    println!("    -s, --seed <N>            random seed (default: 1234)");
    println!("        --lr <RATE>           learning rate (default: 0.01)");
    println!("        --help                Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    cargo run --bin forecast -- --csv GOOG.csv --config params.json");
    println!("    cargo run --bin forecast -- --synthetic 400 --seed 7");
}
