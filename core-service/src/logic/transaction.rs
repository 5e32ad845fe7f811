//! Transaction records going into the engine and scored results coming out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incoming transaction. Positivity of `amount` is validated upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: f64,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl Transaction {
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            merchant: None,
            category: None,
            customer_id: None,
        }
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Canonical byte encoding used for content-derived identifiers
    pub(crate) fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&self.amount.to_bits().to_le_bytes());
        for field in [&self.merchant, &self.category, &self.customer_id] {
            match field {
                Some(text) => {
                    out.push(1);
                    out.extend_from_slice(&(text.len() as u64).to_le_bytes());
                    out.extend_from_slice(text.as_bytes());
                }
                None => out.push(0),
            }
        }
        out
    }
}

/// Result of one detection call for one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub id: u64,
    pub amount: f64,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub customer_id: Option<String>,
    pub is_fraud: bool,
    /// Fraud probability in [0, 1], rounded to 4 decimals
    pub fraud_score: f64,
    pub timestamp: DateTime<Utc>,
}

impl ScoredResult {
    pub(crate) fn new(
        id: u64,
        transaction: &Transaction,
        is_fraud: bool,
        fraud_score: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            amount: transaction.amount,
            merchant: transaction.merchant.clone(),
            category: transaction.category.clone(),
            customer_id: transaction.customer_id.clone(),
            is_fraud,
            fraud_score,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_optional_fields() {
        let tx: Transaction = serde_json::from_str(r#"{"amount": 99.5}"#).unwrap();
        assert_eq!(tx, Transaction::new(99.5));
    }

    #[test]
    fn test_canonical_bytes_distinguish_fields() {
        let a = Transaction::new(1.0).with_merchant("ab");
        let b = Transaction::new(1.0).with_category("ab");
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
        assert_eq!(a.canonical_bytes(), a.clone().canonical_bytes());
    }
}
