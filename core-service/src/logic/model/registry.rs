//! Model Registry - lifecycle of the active (model, scaler) pair
//!
//! The registry always ends a `load` with a usable model: a valid artifact
//! is used as is, anything else (missing file, decode failure, layout
//! mismatch) falls back to a freshly initialized forest and is only logged.
//!
//! The active pair lives behind `RwLock<Option<Arc<ActiveModel>>>`. A reload
//! builds the new `ActiveModel` first and swaps the `Arc` in one write, so a
//! scoring call holding a snapshot keeps a consistent pair.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::artifact::{self, LoadedArtifact};
use super::forest::{ForestParams, IsolationForest};
use super::scaler::StandardScaler;
use crate::logic::error::ArtifactError;
use crate::logic::features::FEATURE_COUNT;

/// Where the active model came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSource {
    /// Bundle with model and scaler
    Bundle,
    /// Bare model, scaler constructed unfitted
    Legacy,
    /// No usable artifact; freshly initialized forest
    Fresh { reason: String },
}

impl ModelSource {
    pub fn is_fresh(&self) -> bool {
        matches!(self, ModelSource::Fresh { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelSource::Bundle => "bundle",
            ModelSource::Legacy => "legacy",
            ModelSource::Fresh { .. } => "fresh",
        }
    }
}

/// Model metadata for status surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_path: String,
    pub source: ModelSource,
    pub n_estimators: usize,
    pub n_features: usize,
    pub contamination: f64,
    pub scaler_fitted: bool,
    /// SHA-256 of the artifact bytes; None for fresh models
    pub digest: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// Immutable (model, scaler) pair plus metadata
#[derive(Debug)]
pub struct ActiveModel {
    pub model: IsolationForest,
    pub scaler: StandardScaler,
    pub info: ModelInfo,
}

impl ActiveModel {
    fn new(
        model: IsolationForest,
        scaler: StandardScaler,
        source: ModelSource,
        path: &Path,
        digest: Option<String>,
    ) -> Self {
        let info = ModelInfo {
            model_path: path.display().to_string(),
            source,
            n_estimators: model.n_estimators(),
            n_features: model.n_features,
            contamination: model.params.contamination,
            scaler_fitted: scaler.is_fitted(),
            digest,
            loaded_at: Utc::now(),
        };
        Self { model, scaler, info }
    }

    /// Untrained forest with an unfitted scaler
    pub fn fresh(params: &ForestParams, path: &Path, reason: impl Into<String>) -> Self {
        Self::new(
            IsolationForest::initialize(params, FEATURE_COUNT),
            StandardScaler::new(),
            ModelSource::Fresh { reason: reason.into() },
            path,
            None,
        )
    }

    pub fn source(&self) -> &ModelSource {
        &self.info.source
    }
}

/// Owner of the active model for one scoring service
pub struct ModelRegistry {
    active: RwLock<Option<Arc<ActiveModel>>>,
    params: ForestParams,
    default_path: PathBuf,
}

impl ModelRegistry {
    /// Unloaded registry; `params` are used for fresh models
    pub fn new(params: ForestParams, default_path: impl Into<PathBuf>) -> Self {
        Self {
            active: RwLock::new(None),
            params,
            default_path: default_path.into(),
        }
    }

    /// Load from `path`, falling back to a fresh model. Never fails.
    pub fn load(&self, path: impl AsRef<Path>) -> Arc<ActiveModel> {
        let active = Arc::new(resolve(path.as_ref(), &self.params));
        *self.active.write() = Some(Arc::clone(&active));
        active
    }

    /// Load again from the default path
    pub fn reload(&self) -> Arc<ActiveModel> {
        self.load(&self.default_path)
    }

    /// Active snapshot, loading from the default path first if needed
    pub fn ensure_loaded(&self) -> Arc<ActiveModel> {
        if let Some(active) = self.active.read().as_ref() {
            return Arc::clone(active);
        }

        let mut guard = self.active.write();
        if let Some(active) = guard.as_ref() {
            return Arc::clone(active);
        }
        let active = Arc::new(resolve(&self.default_path, &self.params));
        *guard = Some(Arc::clone(&active));
        active
    }

    pub fn is_ready(&self) -> bool {
        self.active.read().is_some()
    }

    pub fn snapshot(&self) -> Option<Arc<ActiveModel>> {
        self.active.read().clone()
    }

    pub fn info(&self) -> Option<ModelInfo> {
        self.active.read().as_ref().map(|active| active.info.clone())
    }
}

fn resolve(path: &Path, params: &ForestParams) -> ActiveModel {
    match artifact::read_artifact(path) {
        Ok((LoadedArtifact::Bundle { model, scaler }, digest)) => {
            log::info!("Model loaded from {} ({} trees)", path.display(), model.n_estimators());
            ActiveModel::new(model, scaler, ModelSource::Bundle, path, Some(digest))
        }
        Ok((LoadedArtifact::Legacy { model }, digest)) => {
            log::info!("Legacy model loaded from {} without scaler", path.display());
            ActiveModel::new(model, StandardScaler::new(), ModelSource::Legacy, path, Some(digest))
        }
        Err(ArtifactError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            log::info!("No existing model found at {}. Initializing new model...", path.display());
            ActiveModel::fresh(params, path, "artifact not found")
        }
        Err(e) => {
            log::warn!("Error loading model from {}: {}. Initializing new model...", path.display(), e);
            ActiveModel::fresh(params, path, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::scaler::ScalerStats;
    use ndarray::Array2;

    fn params() -> ForestParams {
        ForestParams { n_estimators: 10, max_samples: 32, ..Default::default() }
    }

    fn write_bundle(path: &Path) {
        let data = Array2::from_shape_fn((40, FEATURE_COUNT), |(i, j)| ((i + 3) * (j + 2)) as f64);
        let stats = ScalerStats::fit(&data).unwrap();
        let model = IsolationForest::fit(&stats.transform(&data).unwrap(), &params()).unwrap();
        artifact::save_bundle(path, &model, &StandardScaler::fitted(stats)).unwrap();
    }

    #[test]
    fn test_starts_unloaded() {
        let registry = ModelRegistry::new(params(), "unused.json");
        assert!(!registry.is_ready());
        assert!(registry.snapshot().is_none());
        assert!(registry.info().is_none());
    }

    #[test]
    fn test_missing_artifact_falls_back_to_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(params(), dir.path().join("missing.json"));

        let active = registry.reload();

        assert!(registry.is_ready());
        assert!(active.source().is_fresh());
        assert!(!active.scaler.is_fitted());
        assert_eq!(active.model.n_features, FEATURE_COUNT);
        assert!(active.info.digest.is_none());
    }

    #[test]
    fn test_corrupt_artifact_falls_back_to_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, b"{ truncated").unwrap();

        let registry = ModelRegistry::new(params(), &path);
        let active = registry.load(&path);

        assert!(registry.is_ready());
        match active.source() {
            ModelSource::Fresh { reason } => assert!(reason.contains("decode")),
            other => panic!("expected fresh, got {:?}", other),
        }
    }

    #[test]
    fn test_bundle_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        write_bundle(&path);

        let registry = ModelRegistry::new(params(), &path);
        let active = registry.load(&path);

        assert_eq!(active.source(), &ModelSource::Bundle);
        assert!(active.scaler.is_fitted());
        assert_eq!(active.info.n_estimators, 10);
        assert_eq!(active.info.digest.as_ref().map(|d| d.len()), Some(64));
    }

    #[test]
    fn test_legacy_gets_unfitted_scaler() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let data = Array2::from_shape_fn((40, FEATURE_COUNT), |(i, j)| (i * j) as f64);
        let model = IsolationForest::fit(&data, &params()).unwrap();
        artifact::save_legacy(&path, &model).unwrap();

        let registry = ModelRegistry::new(params(), &path);
        let active = registry.load(&path);

        assert_eq!(active.source(), &ModelSource::Legacy);
        assert!(!active.scaler.is_fitted());
    }

    #[test]
    fn test_ensure_loaded_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(params(), dir.path().join("missing.json"));

        let first = registry.ensure_loaded();
        let second = registry.ensure_loaded();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reload_swaps_whole_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let registry = ModelRegistry::new(params(), &path);

        let before = registry.reload();
        assert!(before.source().is_fresh());

        write_bundle(&path);
        let after = registry.reload();

        // Old snapshot is untouched, new one is complete
        assert!(before.source().is_fresh());
        assert!(!before.scaler.is_fitted());
        assert_eq!(after.source(), &ModelSource::Bundle);
        assert!(after.scaler.is_fitted());
        assert!(Arc::ptr_eq(&after, &registry.snapshot().unwrap()));
    }
}
