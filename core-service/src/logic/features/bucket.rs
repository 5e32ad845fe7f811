//! Text Bucket Features
//!
//! Optional text fields (merchant, category, customer) are folded into a
//! small integer range with CRC32 so buckets are identical across runs,
//! processes and platforms.

use super::layout::{CATEGORY_BUCKETS, CUSTOMER_BUCKETS, MERCHANT_BUCKETS};
use super::vector::{FeatureExtractor, FeatureVector};
use crate::logic::transaction::Transaction;

/// Stable bucket for a text value; absent or empty text maps to 0
pub fn bucket(value: Option<&str>, buckets: u32) -> u32 {
    match value {
        Some(text) if !text.is_empty() && buckets > 0 => crc32fast::hash(text.as_bytes()) % buckets,
        _ => 0,
    }
}

/// Which optional transaction field a bucket reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Merchant,
    Category,
    Customer,
}

impl TextField {
    fn read<'a>(&self, transaction: &'a Transaction) -> Option<&'a str> {
        match self {
            TextField::Merchant => transaction.merchant.as_deref(),
            TextField::Category => transaction.category.as_deref(),
            TextField::Customer => transaction.customer_id.as_deref(),
        }
    }
}

/// Bucketed text feature written into a single vector slot
#[derive(Debug, Clone, Copy)]
pub struct BucketFeature {
    pub field: TextField,
    pub index: usize,
    pub buckets: u32,
}

impl BucketFeature {
    pub const MERCHANT: Self = Self { field: TextField::Merchant, index: 1, buckets: MERCHANT_BUCKETS };
    pub const CATEGORY: Self = Self { field: TextField::Category, index: 2, buckets: CATEGORY_BUCKETS };
    pub const CUSTOMER: Self = Self { field: TextField::Customer, index: 3, buckets: CUSTOMER_BUCKETS };
}

impl FeatureExtractor for BucketFeature {
    fn extract(&self, transaction: &Transaction, vector: &mut FeatureVector) {
        vector.set(self.index, bucket(self.field.read(transaction), self.buckets) as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_is_stable() {
        // Pinned: CRC32("Amazon") must never change between releases
        assert_eq!(bucket(Some("Amazon"), 1000), crc32fast::hash(b"Amazon") % 1000);
        assert_eq!(bucket(Some("Amazon"), 1000), bucket(Some("Amazon"), 1000));
    }

    #[test]
    fn test_bucket_range() {
        for name in ["a", "grocery", "electronics", "travel", "ÄÖÜ"] {
            assert!(bucket(Some(name), 100) < 100);
        }
    }

    #[test]
    fn test_absent_and_empty_map_to_zero() {
        assert_eq!(bucket(None, 1000), 0);
        assert_eq!(bucket(Some(""), 1000), 0);
    }
}
