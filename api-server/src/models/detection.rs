//! Detection request/response models

use fraudshield_core::{ScoredResult, Transaction};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransactionInput {
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub customer_id: Option<String>,
}

impl From<TransactionInput> for Transaction {
    fn from(input: TransactionInput) -> Self {
        Transaction {
            amount: input.amount,
            merchant: input.merchant,
            category: input.category,
            customer_id: input.customer_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DetectionRequest {
    #[validate(nested)]
    pub transactions: Vec<TransactionInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub results: Vec<ScoredResult>,
    pub total_transactions: usize,
    pub fraud_count: usize,
    pub normal_count: usize,
}

impl From<Vec<ScoredResult>> for DetectionResponse {
    fn from(results: Vec<ScoredResult>) -> Self {
        let fraud_count = results.iter().filter(|r| r.is_fraud).count();
        Self {
            total_transactions: results.len(),
            normal_count: results.len() - fraud_count,
            fraud_count,
            results,
        }
    }
}
