//! Model Module - Anomaly Scoring
//!
//! Scaler, isolation forest, score normalization, decision policy and the
//! registry that owns the fitted pair.

pub mod artifact;
pub mod forest;
pub mod normalize;
pub mod registry;
pub mod scaler;
pub mod threshold;

// Re-export common types
pub use forest::{ForestParams, IsolationForest, Label};
pub use normalize::{normalize, round4};
pub use registry::{ActiveModel, ModelInfo, ModelRegistry, ModelSource};
pub use scaler::{ScalerStats, StandardScaler};
pub use threshold::{DecisionPolicy, DecisionReason, DEFAULT_FRAUD_THRESHOLD};
