//! Features Module - Feature Extraction Engine
//!
//! Maps a transaction to its fixed-length feature vector:
//! `[amount, merchant_bucket, category_bucket, customer_bucket]`.

pub mod bucket;
pub mod layout;
pub mod vector;

#[cfg(test)]
mod tests;

pub use bucket::{bucket, BucketFeature, TextField};
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use vector::{to_matrix, AmountFeature, FeatureExtractor, FeatureVector};

use crate::logic::transaction::Transaction;

/// Extractors in slot order
const EXTRACTORS: [&dyn FeatureExtractor; FEATURE_COUNT] = [
    &AmountFeature,
    &BucketFeature::MERCHANT,
    &BucketFeature::CATEGORY,
    &BucketFeature::CUSTOMER,
];

/// Extract the feature vector of a single transaction
pub fn extract(transaction: &Transaction) -> FeatureVector {
    let mut vector = FeatureVector::new();
    for extractor in EXTRACTORS {
        extractor.extract(transaction, &mut vector);
    }
    vector
}

/// Extract one vector per transaction, input order preserved
pub fn extract_all(transactions: &[Transaction]) -> Vec<FeatureVector> {
    transactions.iter().map(extract).collect()
}
