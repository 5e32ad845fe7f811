//! CLI commands: fit a bundle from CSV, inspect an artifact, score a CSV.
//!
//! The binary only parses arguments and prints what these return.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::logic::config::EngineConfig;
use crate::logic::engine::{DetectionSnapshot, ScoringEngine};
use crate::logic::features::layout::LayoutInfo;
use crate::logic::features::{extract_all, to_matrix};
use crate::logic::ingest::read_transactions_from_path;
use crate::logic::model::artifact::save_bundle;
use crate::logic::model::{
    ForestParams, IsolationForest, ModelInfo, ModelRegistry, ScalerStats, StandardScaler,
};
use crate::logic::transaction::ScoredResult;

/// Outcome of `fit`
#[derive(Debug, Clone, Serialize)]
pub struct FitSummary {
    pub digest: String,
    pub n_transactions: usize,
    pub n_estimators: usize,
    pub offset: f64,
}

/// Outcome of `inspect`
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub model: ModelInfo,
    pub layout: LayoutInfo,
}

/// Outcome of `score`
#[derive(Debug, Clone)]
pub struct ScoreReport {
    pub results: Vec<ScoredResult>,
    pub stats: DetectionSnapshot,
}

/// Fit scaler and forest on a CSV and write the bundle to `output`
pub fn fit(input: &Path, output: &Path, params: &ForestParams) -> Result<FitSummary> {
    params.validate()?;

    let transactions = read_transactions_from_path(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let matrix = to_matrix(&extract_all(&transactions));

    let stats = ScalerStats::fit(&matrix)?;
    let scaled = stats.transform(&matrix)?;
    let model = IsolationForest::fit(&scaled, params)?;

    let digest = save_bundle(output, &model, &StandardScaler::fitted(stats))
        .with_context(|| format!("writing {}", output.display()))?;

    log::info!(
        "Fitted {} trees on {} transactions, offset {:.6}",
        model.n_estimators(),
        transactions.len(),
        model.offset
    );

    Ok(FitSummary {
        digest,
        n_transactions: transactions.len(),
        n_estimators: model.n_estimators(),
        offset: model.offset,
    })
}

/// Load `artifact` the way the services do and describe what was loaded
pub fn inspect(artifact: &Path) -> InspectReport {
    let registry = ModelRegistry::new(ForestParams::default(), artifact);
    let active = registry.load(artifact);
    InspectReport {
        model: active.info.clone(),
        layout: LayoutInfo::current(),
    }
}

/// Score every row of a CSV against the model at `config.model_path`
pub fn score(input: &Path, config: EngineConfig) -> Result<ScoreReport> {
    config.validate()?;

    let registry = Arc::new(ModelRegistry::new(config.forest.clone(), &config.model_path));
    let active = registry.load(&config.model_path);
    if active.source().is_fresh() {
        log::warn!("Scoring with an untrained model; results are not meaningful");
    }

    let engine = ScoringEngine::new(registry, config);
    let transactions = read_transactions_from_path(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let results = engine.detect_batch(&transactions)?;

    Ok(ScoreReport {
        results,
        stats: engine.stats(),
    })
}
