//! Logic Module - Scoring pipeline
//!
//! - `features/` - Transaction → feature vector
//! - `model/` - Scaler, isolation forest, normalization, policy, registry
//! - `engine` - Batch scoring over the active model
//! - `ingest` - CSV boundary

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod ingest;
pub mod model;
pub mod transaction;
