//! Model hyperparameters and their validated form

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Raw hyperparameter mapping, as supplied by the caller.
///
/// Deserializes from a JSON mapping with exactly the recognized keys;
/// unrecognized keys are ignored, missing required keys fail. `drop_rate_2`
/// is required only when `units_2 > 0`. The pipeline never mutates a config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// History window length fed to the network
    pub offset: usize,
    /// Units in the first recurrent layer
    pub units_1: usize,
    /// Drop probability applied to the first layer's output
    pub drop_rate_1: f64,
    /// Units in the second recurrent layer; 0 selects the single-layer topology
    pub units_2: usize,
    /// Drop probability for the second layer, required when `units_2 > 0`
    #[serde(default)]
    pub drop_rate_2: Option<f64>,
    /// Mini-batch size for training
    pub batch_size: usize,
    /// Full passes over the training windows
    pub epochs: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            offset: 60,
            units_1: 32,
            drop_rate_1: 0.0,
            units_2: 32,
            drop_rate_2: Some(0.0),
            batch_size: 5,
            epochs: 10,
        }
    }
}

impl ModelConfig {
    /// Parses a config from a JSON mapping
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ForecastError::config(format!("cannot parse config: {e}")))
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_units(mut self, units_1: usize, units_2: usize) -> Self {
        self.units_1 = units_1;
        self.units_2 = units_2;
        self
    }

    pub fn with_drop_rates(mut self, drop_rate_1: f64, drop_rate_2: Option<f64>) -> Self {
        self.drop_rate_1 = drop_rate_1;
        self.drop_rate_2 = drop_rate_2;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Checks every constraint and resolves the layer topology.
    ///
    /// The one-vs-two-layer choice is decided here, once, into the [`Topology`]
    /// variant; nothing downstream re-inspects `units_2`.
    pub fn validate(&self) -> Result<ModelSpec> {
        if self.offset == 0 {
            return Err(ForecastError::config("offset must be > 0"));
        }
        if self.units_1 == 0 {
            return Err(ForecastError::config("units_1 must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::config("batch_size must be > 0"));
        }
        if self.epochs == 0 {
            return Err(ForecastError::config("epochs must be > 0"));
        }
        check_drop_rate("drop_rate_1", self.drop_rate_1)?;

        let topology = if self.units_2 > 0 {
            let drop_rate_2 = self.drop_rate_2.ok_or_else(|| {
                ForecastError::config("drop_rate_2 is required when units_2 > 0")
            })?;
            check_drop_rate("drop_rate_2", drop_rate_2)?;

            Topology::TwoLayer {
                units_1: self.units_1,
                drop_rate_1: self.drop_rate_1,
                units_2: self.units_2,
                drop_rate_2,
            }
        } else {
            Topology::SingleLayer {
                units: self.units_1,
                drop_rate: self.drop_rate_1,
            }
        };

        Ok(ModelSpec {
            offset: self.offset,
            topology,
            batch_size: self.batch_size,
            epochs: self.epochs,
        })
    }
}

fn check_drop_rate(name: &str, rate: f64) -> Result<()> {
    if !(0.0..1.0).contains(&rate) {
        return Err(ForecastError::config(format!(
            "{name} must be in [0, 1), got {rate}"
        )));
    }
    Ok(())
}

/// Recurrent stack shape, fixed at validation time.
///
/// Exactly one or two recurrent layers; an exhaustive variant rather than a
/// zero/nonzero unit-count convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Topology {
    SingleLayer {
        units: usize,
        drop_rate: f64,
    },
    TwoLayer {
        units_1: usize,
        drop_rate_1: f64,
        units_2: usize,
        drop_rate_2: f64,
    },
}

impl Topology {
    /// Units feeding the linear output layer
    pub fn output_units(&self) -> usize {
        match self {
            Topology::SingleLayer { units, .. } => *units,
            Topology::TwoLayer { units_2, .. } => *units_2,
        }
    }

    /// Number of recurrent layers
    pub fn depth(&self) -> usize {
        match self {
            Topology::SingleLayer { .. } => 1,
            Topology::TwoLayer { .. } => 2,
        }
    }
}

/// Validated hyperparameters, ready for model construction and training
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    pub offset: usize,
    pub topology: Topology,
    pub batch_size: usize,
    pub epochs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ModelConfig {
        ModelConfig {
            offset: 10,
            units_1: 8,
            drop_rate_1: 0.1,
            units_2: 0,
            drop_rate_2: None,
            batch_size: 4,
            epochs: 5,
        }
    }

    #[test]
    fn test_zero_units_2_selects_single_layer() {
        let spec = base_config().validate().unwrap();

        assert_eq!(spec.topology.depth(), 1);
        assert_eq!(spec.topology.output_units(), 8);
    }

    #[test]
    fn test_positive_units_2_selects_two_layers() {
        let spec = base_config()
            .with_units(8, 4)
            .with_drop_rates(0.1, Some(0.2))
            .validate()
            .unwrap();

        assert_eq!(spec.topology.depth(), 2);
        assert_eq!(spec.topology.output_units(), 4);
    }

    #[test]
    fn test_drop_rate_2_required_for_two_layers() {
        let err = base_config().with_units(8, 4).validate().unwrap_err();
        assert!(matches!(err, ForecastError::Configuration { .. }));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(base_config().with_offset(0).validate().is_err());
        assert!(base_config().with_units(0, 0).validate().is_err());
        assert!(base_config().with_batch_size(0).validate().is_err());
        assert!(base_config().with_epochs(0).validate().is_err());
        assert!(base_config()
            .with_drop_rates(1.0, None)
            .validate()
            .is_err());
    }

    #[test]
    fn test_json_ignores_unknown_keys() {
        let config = ModelConfig::from_json(
            r#"{
                "offset": 60, "units_1": 32, "drop_rate_1": 0.0,
                "units_2": 32, "drop_rate_2": 0.0,
                "batch_size": 5, "epochs": 10,
                "comment": "ignored"
            }"#,
        )
        .unwrap();

        assert_eq!(config.offset, 60);
        assert_eq!(config.drop_rate_2, Some(0.0));
    }

    #[test]
    fn test_json_missing_required_key_fails() {
        let err = ModelConfig::from_json(r#"{"offset": 60}"#).unwrap_err();
        assert!(matches!(err, ForecastError::Configuration { .. }));
    }
}
