//! Run report: configuration echoed alongside the accuracy metrics

use crate::evaluation::EvaluationResult;
use crate::model::ModelConfig;
use serde::Serialize;
use std::fmt;

/// A single report value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Int(u64),
    Float(f64),
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Int(v) => write!(f, "{v}"),
            ReportValue::Float(v) => write!(f, "{v:.6}"),
        }
    }
}

/// Ordered parameter/metric record for one pipeline run.
///
/// Holds every configuration key in declaration order followed by the scalar
/// metrics `rms` and `r_squared`. The per-point prediction sequence is kept
/// separately on [`EvaluationResult`] for plotting or inspection by the
/// caller. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    entries: Vec<(String, ReportValue)>,
}

impl Report {
    pub fn entries(&self) -> &[(String, ReportValue)] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<ReportValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|(key, _)| key.len())
            .max()
            .unwrap_or(0);
        for (key, value) in &self.entries {
            writeln!(f, "{key:width$}  {value}")?;
        }
        Ok(())
    }
}

/// Merges the configuration and the evaluation metrics into one [`Report`].
///
/// Side-effect free; neither input is modified.
pub fn aggregate(config: &ModelConfig, evaluation: &EvaluationResult) -> Report {
    let mut entries: Vec<(String, ReportValue)> = vec![
        ("offset".into(), ReportValue::Int(config.offset as u64)),
        ("units_1".into(), ReportValue::Int(config.units_1 as u64)),
        ("drop_rate_1".into(), ReportValue::Float(config.drop_rate_1)),
        ("units_2".into(), ReportValue::Int(config.units_2 as u64)),
    ];
    if let Some(drop_rate_2) = config.drop_rate_2 {
        entries.push(("drop_rate_2".into(), ReportValue::Float(drop_rate_2)));
    }
    entries.push((
        "batch_size".into(),
        ReportValue::Int(config.batch_size as u64),
    ));
    entries.push(("epochs".into(), ReportValue::Int(config.epochs as u64)));

    entries.push(("rms".into(), ReportValue::Float(evaluation.rmse)));
    entries.push(("r_squared".into(), ReportValue::Float(evaluation.r_squared)));

    Report { entries }
}
