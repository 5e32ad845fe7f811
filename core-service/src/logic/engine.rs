//! Scoring Engine
//!
//! Extractor → Scaler → Isolation Forest → Normalizer → Decision Policy,
//! run as one matrix pass per call. A batch either scores completely or
//! fails with a `ScoringError`; results come back in input order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logic::config::{EngineConfig, IdStrategy, ScalingMode};
use crate::logic::error::ScoringError;
use crate::logic::features::{extract_all, to_matrix, FEATURE_LAYOUT};
use crate::logic::model::{normalize, round4, ActiveModel, ModelRegistry, StandardScaler};
use crate::logic::transaction::{ScoredResult, Transaction};

/// Range of content-derived identifiers
const CONTENT_ID_MODULUS: u32 = 1_000_000;

/// Counters over everything this engine has scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    pub total_transactions: u64,
    pub fraud_transactions: u64,
    pub normal_transactions: u64,
    /// Percentage, 2 decimals
    pub fraud_rate: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct DetectionStats {
    total: AtomicU64,
    fraud: AtomicU64,
    last_updated: Mutex<Option<DateTime<Utc>>>,
}

impl DetectionStats {
    fn record(&self, results: &[ScoredResult], at: DateTime<Utc>) {
        let fraud = results.iter().filter(|r| r.is_fraud).count() as u64;
        self.total.fetch_add(results.len() as u64, Ordering::Relaxed);
        self.fraud.fetch_add(fraud, Ordering::Relaxed);

        let mut last = self.last_updated.lock();
        if last.map_or(true, |prev| at > prev) {
            *last = Some(at);
        }
    }

    fn snapshot(&self) -> DetectionSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let fraud = self.fraud.load(Ordering::Relaxed).min(total);
        let fraud_rate = if total > 0 {
            ((fraud as f64 / total as f64) * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };

        DetectionSnapshot {
            total_transactions: total,
            fraud_transactions: fraud,
            normal_transactions: total - fraud,
            fraud_rate,
            last_updated: *self.last_updated.lock(),
        }
    }
}

/// Scores transactions against the registry's active model
pub struct ScoringEngine {
    registry: Arc<ModelRegistry>,
    config: EngineConfig,
    next_id: AtomicU64,
    stats: DetectionStats,
}

impl ScoringEngine {
    pub fn new(registry: Arc<ModelRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            next_id: AtomicU64::new(1),
            stats: DetectionStats::default(),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score one transaction (a batch of one)
    pub fn detect(&self, transaction: &Transaction) -> Result<ScoredResult, ScoringError> {
        self.detect_batch(std::slice::from_ref(transaction))?
            .into_iter()
            .next()
            .ok_or(ScoringError::EmptyBatch)
    }

    /// Score a batch; `result[i]` belongs to `transactions[i]`
    pub fn detect_batch(&self, transactions: &[Transaction]) -> Result<Vec<ScoredResult>, ScoringError> {
        let started = Instant::now();
        let active = self.registry.ensure_loaded();

        let scaled = self.prepare(&active, transactions)?;
        let evaluated = active.model.evaluate(&scaled)?;
        let timestamp = Utc::now();

        let results: Vec<ScoredResult> = transactions
            .iter()
            .zip(evaluated)
            .map(|(transaction, (label, raw_score))| {
                let probability = normalize(raw_score);
                let is_fraud = self.config.policy.decide(label, probability);
                ScoredResult::new(
                    self.assign_id(transaction),
                    transaction,
                    is_fraud,
                    round4(probability),
                    timestamp,
                )
            })
            .collect();

        self.stats.record(&results, timestamp);

        log::debug!(
            "Scored batch of {} ({} flagged) with {} model in {}us",
            results.len(),
            results.iter().filter(|r| r.is_fraud).count(),
            active.source().name(),
            started.elapsed().as_micros()
        );

        Ok(results)
    }

    /// The scaled matrix the forest sees for this batch
    pub fn scaled_features(&self, transactions: &[Transaction]) -> Result<Array2<f64>, ScoringError> {
        let active = self.registry.ensure_loaded();
        self.prepare(&active, transactions)
    }

    pub fn stats(&self) -> DetectionSnapshot {
        self.stats.snapshot()
    }

    fn prepare(&self, active: &ActiveModel, transactions: &[Transaction]) -> Result<Array2<f64>, ScoringError> {
        if transactions.is_empty() {
            return Err(ScoringError::EmptyBatch);
        }

        let vectors = extract_all(transactions);
        for (row, vector) in vectors.iter().enumerate() {
            if let Some(column) = vector.first_non_finite() {
                log::debug!("Rejecting batch at row {}: {}", row, vector.to_log_entry());
                return Err(ScoringError::NonFiniteFeature {
                    row,
                    column: FEATURE_LAYOUT[column],
                });
            }
        }
        let matrix = to_matrix(&vectors);

        match self.config.scaling_mode {
            ScalingMode::Batch => StandardScaler::fit_transform(&matrix),
            ScalingMode::Persisted if active.scaler.is_fitted() => active.scaler.transform(&matrix),
            ScalingMode::Persisted => {
                log::debug!("Active model has no fitted scaler, scaling batch on itself");
                StandardScaler::fit_transform(&matrix)
            }
        }
    }

    fn assign_id(&self, transaction: &Transaction) -> u64 {
        match self.config.id_strategy {
            IdStrategy::Sequential => self.next_id.fetch_add(1, Ordering::Relaxed),
            IdStrategy::ContentHash => {
                u64::from(crc32fast::hash(&transaction.canonical_bytes()) % CONTENT_ID_MODULUS)
            }
        }
    }
}
