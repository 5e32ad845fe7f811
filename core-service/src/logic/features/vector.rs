//! Feature Vector - Core data structure for model input
//!
//! Versioned feature vector with layout metadata, plus the
//! `FeatureExtractor` trait each feature group implements.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::layout::{layout_hash, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
use crate::logic::transaction::Transaction;

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create a new zeroed feature vector with current version
    pub fn new() -> Self {
        Self::from_values([0.0; FEATURE_COUNT])
    }

    /// Create from raw values with current version
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn set(&mut self, index: usize, value: f64) {
        if index < FEATURE_COUNT {
            self.values[index] = value;
        }
    }

    /// Index of the first NaN/infinite value, if any
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_finite())
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": FEATURE_LAYOUT.iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}

/// Stack feature vectors into an `N x FEATURE_COUNT` matrix, row order preserved
pub fn to_matrix(vectors: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::<f64>::zeros((vectors.len(), FEATURE_COUNT));
    for (mut row, vector) in matrix.rows_mut().into_iter().zip(vectors) {
        row.assign(&ArrayView1::from(vector.as_slice()));
    }
    matrix
}

// ============================================================================
// FEATURE EXTRACTOR TRAIT
// ============================================================================

/// Trait for feature extractors; each writes its own slot(s) of the vector
pub trait FeatureExtractor {
    fn extract(&self, transaction: &Transaction, vector: &mut FeatureVector);
}

/// Raw transaction amount, slot 0
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountFeature;

impl FeatureExtractor for AmountFeature {
    fn extract(&self, transaction: &Transaction, vector: &mut FeatureVector) {
        vector.values[0] = transaction.amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_new() {
        let vector = FeatureVector::new();
        assert_eq!(vector.version, FEATURE_VERSION);
        assert_eq!(vector.layout_hash, layout_hash());
        assert_eq!(vector.as_slice(), &[0.0; FEATURE_COUNT]);
    }

    #[test]
    fn test_first_non_finite() {
        let mut vector = FeatureVector::new();
        assert_eq!(vector.first_non_finite(), None);
        vector.set(0, f64::NAN);
        assert_eq!(vector.first_non_finite(), Some(0));
    }

    #[test]
    fn test_to_matrix_preserves_row_order() {
        let rows = vec![
            FeatureVector::from([1.0, 2.0, 3.0, 4.0]),
            FeatureVector::from([5.0, 6.0, 7.0, 8.0]),
        ];
        let matrix = to_matrix(&rows);
        assert_eq!(matrix.dim(), (2, FEATURE_COUNT));
        assert_eq!(matrix[[0, 3]], 4.0);
        assert_eq!(matrix[[1, 0]], 5.0);
    }

    #[test]
    fn test_to_log_entry() {
        let log = FeatureVector::from([12.5, 0.0, 0.0, 0.0]).to_log_entry();
        assert_eq!(log["feature_version"], FEATURE_VERSION);
        assert_eq!(log["named_values"]["amount"], 12.5);
    }
}
