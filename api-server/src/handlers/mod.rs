//! HTTP handlers

pub mod detect;
pub mod health;
pub mod model;
pub mod stats;
