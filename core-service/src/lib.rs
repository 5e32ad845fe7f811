//! FraudShield core: transaction anomaly scoring with an isolation forest.

pub mod commands;
pub mod constants;
pub mod logic;

pub use logic::config::{EngineConfig, IdStrategy, ScalingMode};
pub use logic::engine::{DetectionSnapshot, ScoringEngine};
pub use logic::error::{ArtifactError, ConfigError, IngestError, ScoringError};
pub use logic::model::{ModelInfo, ModelRegistry, ModelSource};
pub use logic::transaction::{ScoredResult, Transaction};
