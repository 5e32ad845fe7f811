//! Integration Tests for Feature Extraction
//!
//! Checks the extractors work together to fill every slot of the vector.

#[cfg(test)]
mod integration_tests {
    use crate::logic::features::{bucket, extract, extract_all, FEATURE_COUNT};
    use crate::logic::transaction::Transaction;

    fn full(amount: f64) -> Transaction {
        Transaction {
            amount,
            merchant: Some("Coffee Corner".to_string()),
            category: Some("food".to_string()),
            customer_id: Some("C-1042".to_string()),
        }
    }

    /// All extractors combined
    #[test]
    fn test_all_extractors_combined() {
        let vector = extract(&full(42.0));

        assert_eq!(vector.as_slice().len(), FEATURE_COUNT);
        assert_eq!(vector.values[0], 42.0);
        assert_eq!(vector.values[1], bucket(Some("Coffee Corner"), 1000) as f64);
        assert_eq!(vector.values[2], bucket(Some("food"), 100) as f64);
        assert_eq!(vector.values[3], bucket(Some("C-1042"), 1000) as f64);
    }

    #[test]
    fn test_missing_fields_bucket_to_zero() {
        let vector = extract(&Transaction::new(10.0));
        assert_eq!(vector.as_slice(), &[10.0, 0.0, 0.0, 0.0]);
    }

    /// Unknown and undeclared merchants are indistinguishable
    #[test]
    fn test_empty_merchant_same_as_absent() {
        let mut with_empty = Transaction::new(10.0);
        with_empty.merchant = Some(String::new());
        assert_eq!(extract(&with_empty), extract(&Transaction::new(10.0)));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        assert_eq!(extract(&full(7.5)), extract(&full(7.5)));
    }

    #[test]
    fn test_amount_is_not_validated() {
        let vector = extract(&Transaction::new(-3.0));
        assert_eq!(vector.values[0], -3.0);
    }

    #[test]
    fn test_extract_all_preserves_order() {
        let batch = vec![Transaction::new(1.0), Transaction::new(2.0), Transaction::new(3.0)];
        let amounts: Vec<f64> = extract_all(&batch).iter().map(|v| v.values[0]).collect();
        assert_eq!(amounts, vec![1.0, 2.0, 3.0]);
    }
}
