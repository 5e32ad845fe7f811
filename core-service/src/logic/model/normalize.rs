//! Score Normalizer
//!
//! Affine rescaling of raw outlier scores onto a fraud probability. Raw
//! scores are treated as spanning `[-0.5, 0.5]`; anything outside saturates.
//! This is a heuristic, not a calibrated probability.

/// Lower end of the nominal raw score range
pub const RAW_SCORE_MIN: f64 = -0.5;
/// Upper end of the nominal raw score range
pub const RAW_SCORE_MAX: f64 = 0.5;

/// Map a raw outlier score (lower = more anomalous) to [0, 1].
/// NaN maps to 1.0.
pub fn normalize(raw_score: f64) -> f64 {
    let probability = 1.0 - (raw_score - RAW_SCORE_MIN) / (RAW_SCORE_MAX - RAW_SCORE_MIN);
    if probability.is_nan() {
        return 1.0;
    }
    probability.clamp(0.0, 1.0)
}

/// Round to 4 decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
