//! Decision Policy
//!
//! A transaction is flagged when the ensemble labels it anomalous OR its
//! fraud probability reaches the configured threshold. Either signal alone
//! is enough.

use serde::{Deserialize, Serialize};

use super::forest::Label;
use crate::logic::error::ConfigError;

/// Default fraud probability threshold
pub const DEFAULT_FRAUD_THRESHOLD: f64 = 0.5;

/// Which signal(s) flagged a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Neither signal fired
    Clear,
    /// Ensemble label only
    Ensemble,
    /// Probability threshold only
    Threshold,
    Both,
}

impl DecisionReason {
    pub fn is_fraud(&self) -> bool {
        !matches!(self, DecisionReason::Clear)
    }
}

/// Threshold policy shared by every transaction in the process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// Probability at or above which a transaction is fraud (0.0 - 1.0)
    pub threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FRAUD_THRESHOLD,
        }
    }
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        Ok(Self { threshold })
    }

    /// Final verdict: anomalous label OR probability >= threshold
    pub fn decide(&self, label: Label, probability: f64) -> bool {
        self.explain(label, probability).is_fraud()
    }

    pub fn explain(&self, label: Label, probability: f64) -> DecisionReason {
        let by_ensemble = label == Label::Anomalous;
        let by_threshold = probability >= self.threshold;
        match (by_ensemble, by_threshold) {
            (true, true) => DecisionReason::Both,
            (true, false) => DecisionReason::Ensemble,
            (false, true) => DecisionReason::Threshold,
            (false, false) => DecisionReason::Clear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        assert_eq!(DecisionPolicy::default().threshold, 0.5);
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(DecisionPolicy::new(0.0).is_ok());
        assert!(DecisionPolicy::new(1.0).is_ok());
        assert_eq!(DecisionPolicy::new(1.5), Err(ConfigError::ThresholdOutOfRange(1.5)));
        assert!(DecisionPolicy::new(f64::NAN).is_err());
    }

    #[test]
    fn test_either_signal_flags() {
        let policy = DecisionPolicy::default();
        assert!(policy.decide(Label::Anomalous, 0.0));
        assert!(policy.decide(Label::Normal, 0.5));
        assert!(!policy.decide(Label::Normal, 0.4999));
        assert_eq!(policy.explain(Label::Anomalous, 0.9), DecisionReason::Both);
    }

    #[test]
    fn test_anomalous_label_ignores_threshold() {
        for threshold in [0.0, 0.3, 0.7, 1.0] {
            let policy = DecisionPolicy::new(threshold).unwrap();
            assert!(policy.decide(Label::Anomalous, 0.01));
        }
    }

    #[test]
    fn test_threshold_monotonicity() {
        let probabilities = [0.0, 0.1, 0.35, 0.5, 0.62, 0.99, 1.0];
        let thresholds = [0.0, 0.2, 0.4, 0.5, 0.6, 0.8, 1.0];

        for p in probabilities {
            for pair in thresholds.windows(2) {
                let low = DecisionPolicy::new(pair[0]).unwrap();
                let high = DecisionPolicy::new(pair[1]).unwrap();
                // Raising the threshold can only clear threshold-driven flags
                if high.decide(Label::Normal, p) {
                    assert!(low.decide(Label::Normal, p));
                }
                assert!(low.decide(Label::Anomalous, p) && high.decide(Label::Anomalous, p));
            }
        }
    }
}
