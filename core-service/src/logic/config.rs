//! Engine configuration

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::ConfigError;
use crate::logic::model::{DecisionPolicy, ForestParams};

/// How a batch is scaled before scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Re-fit the scaler on every scored batch (legacy behaviour).
    /// The same transaction can score differently in different batches.
    #[default]
    Batch,
    /// Use the scaler statistics persisted with the model; batches whose
    /// model has no fitted scaler fall back to `Batch`.
    Persisted,
}

impl FromStr for ScalingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(ScalingMode::Batch),
            "persisted" => Ok(ScalingMode::Persisted),
            other => Err(ConfigError::UnknownValue {
                key: "SCALING_MODE",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalingMode::Batch => "batch",
            ScalingMode::Persisted => "persisted",
        })
    }
}

/// How scored results get their identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    /// Per-engine counter starting at 1
    #[default]
    Sequential,
    /// CRC32 of the transaction content modulo 1 000 000; collisions possible
    ContentHash,
}

impl FromStr for IdStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(IdStrategy::Sequential),
            "content-hash" | "content_hash" => Ok(IdStrategy::ContentHash),
            other => Err(ConfigError::UnknownValue {
                key: "ID_STRATEGY",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdStrategy::Sequential => "sequential",
            IdStrategy::ContentHash => "content-hash",
        })
    }
}

/// Everything the scoring engine needs besides the model itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    pub policy: DecisionPolicy,
    pub scaling_mode: ScalingMode,
    pub id_strategy: IdStrategy,
    /// Hyperparameters for fresh (untrained) models
    pub forest: ForestParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(constants::DEFAULT_MODEL_PATH),
            policy: DecisionPolicy::default(),
            scaling_mode: ScalingMode::default(),
            id_strategy: IdStrategy::default(),
            forest: ForestParams::default(),
        }
    }
}

impl EngineConfig {
    /// Load from environment variables, defaults for anything unset or invalid
    pub fn from_env() -> Self {
        Self {
            model_path: constants::get_model_path(),
            policy: DecisionPolicy {
                threshold: constants::get_fraud_threshold(),
            },
            scaling_mode: constants::get_scaling_mode(),
            id_strategy: constants::get_id_strategy(),
            forest: ForestParams::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.policy = DecisionPolicy::new(threshold)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        DecisionPolicy::new(self.policy.threshold)?;
        self.forest.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.policy.threshold, 0.5);
        assert_eq!(config.scaling_mode, ScalingMode::Batch);
        assert_eq!(config.id_strategy, IdStrategy::Sequential);
        assert_eq!(config.forest.n_estimators, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("Persisted".parse::<ScalingMode>(), Ok(ScalingMode::Persisted));
        assert_eq!(" batch ".parse::<ScalingMode>(), Ok(ScalingMode::Batch));
        assert!("rolling".parse::<ScalingMode>().is_err());
        assert_eq!("content-hash".parse::<IdStrategy>(), Ok(IdStrategy::ContentHash));
        assert_eq!("sequential".parse::<IdStrategy>(), Ok(IdStrategy::Sequential));
    }

    #[test]
    fn test_display_parses_back() {
        for mode in [ScalingMode::Batch, ScalingMode::Persisted] {
            assert_eq!(mode.to_string().parse::<ScalingMode>(), Ok(mode));
        }
        for strategy in [IdStrategy::Sequential, IdStrategy::ContentHash] {
            assert_eq!(strategy.to_string().parse::<IdStrategy>(), Ok(strategy));
        }
        assert_eq!(IdStrategy::ContentHash.to_string(), "content-hash");
    }

    #[test]
    fn test_with_threshold() {
        assert_eq!(EngineConfig::default().with_threshold(0.8).unwrap().policy.threshold, 0.8);
        assert!(EngineConfig::default().with_threshold(-0.1).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = EngineConfig::default();
        config.policy.threshold = 2.0;
        assert_eq!(config.validate(), Err(ConfigError::ThresholdOutOfRange(2.0)));
    }
}
