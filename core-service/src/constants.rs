//! Central Configuration Constants
//!
//! Single source of truth for configuration defaults and the environment
//! variables that override them.

use std::path::PathBuf;

use crate::logic::config::{IdStrategy, ScalingMode};
use crate::logic::model::DEFAULT_FRAUD_THRESHOLD;

/// Default model artifact location, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "models/isolation_forest_model.json";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "FraudShield";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get model artifact path from environment or use default
pub fn get_model_path() -> PathBuf {
    std::env::var("MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH))
}

/// Get fraud threshold from environment or use default
pub fn get_fraud_threshold() -> f64 {
    parse_threshold(std::env::var("FRAUD_THRESHOLD").ok().as_deref())
}

/// Get scaling mode from environment or use default
pub fn get_scaling_mode() -> ScalingMode {
    parse_or_default("SCALING_MODE", std::env::var("SCALING_MODE").ok().as_deref())
}

/// Get id strategy from environment or use default
pub fn get_id_strategy() -> IdStrategy {
    parse_or_default("ID_STRATEGY", std::env::var("ID_STRATEGY").ok().as_deref())
}

fn parse_threshold(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return DEFAULT_FRAUD_THRESHOLD;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if (0.0..=1.0).contains(&value) => value,
        _ => {
            log::warn!(
                "Ignoring FRAUD_THRESHOLD={:?}: expected a number in [0, 1], using {}",
                raw,
                DEFAULT_FRAUD_THRESHOLD
            );
            DEFAULT_FRAUD_THRESHOLD
        }
    }
}

fn parse_or_default<T>(key: &str, raw: Option<&str>) -> T
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    match raw.map(str::parse::<T>) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            log::warn!("Ignoring {}: {}", key, e);
            T::default()
        }
        None => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold(None), 0.5);
        assert_eq!(parse_threshold(Some("0.75")), 0.75);
        assert_eq!(parse_threshold(Some(" 1 ")), 1.0);
        assert_eq!(parse_threshold(Some("1.5")), 0.5);
        assert_eq!(parse_threshold(Some("high")), 0.5);
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or_default::<ScalingMode>("SCALING_MODE", Some("persisted")), ScalingMode::Persisted);
        assert_eq!(parse_or_default::<ScalingMode>("SCALING_MODE", Some("bogus")), ScalingMode::Batch);
        assert_eq!(parse_or_default::<IdStrategy>("ID_STRATEGY", None), IdStrategy::Sequential);
    }
}
