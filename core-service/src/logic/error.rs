//! Error types for the scoring engine.

use thiserror::Error;

use crate::logic::features::layout::LayoutMismatchError;

/// Structural problems with a scoring call. A failed batch yields no results.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("cannot score an empty batch")]
    EmptyBatch,

    #[error("dimension mismatch: model expects {expected} features, batch has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("non-finite value in batch row {row}, feature '{column}'")]
    NonFiniteFeature { row: usize, column: &'static str },

    #[error("scaler has no fitted statistics")]
    ScalerNotFitted,
}

/// Reasons a model artifact could not be used. The registry turns these
/// into a fresh-model fallback; they never reach scoring callers.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Ingestion failures; any of these rejects the whole input.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV file is empty")]
    Empty,

    #[error("invalid amount {value:?} in row {row}")]
    InvalidAmount { row: usize, value: String },
}

/// Invalid engine configuration values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("fraud threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("contamination must be within (0, 0.5], got {0}")]
    ContaminationOutOfRange(f64),

    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),

    #[error("unknown value {value:?} for {key}")]
    UnknownValue { key: &'static str, value: String },
}
