//! Model Artifact - persisted (model, scaler) pair
//!
//! Two on-disk shapes are accepted:
//! - bundle: `{ "model": ..., "scaler": ..., "feature_version": .., "layout_hash": .. }`
//! - legacy: a bare serialized `IsolationForest`, no scaler
//!
//! The shape is resolved once here into `LoadedArtifact`; nothing downstream
//! re-checks it.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::forest::IsolationForest;
use super::scaler::StandardScaler;
use crate::logic::error::ArtifactError;
use crate::logic::features::layout::{layout_hash, validate_layout, FEATURE_COUNT, FEATURE_VERSION};

/// Current bundle format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Attempts for reading an artifact on transient I/O errors
const READ_ATTEMPTS: u32 = 3;

fn default_format_version() -> u32 {
    ARTIFACT_FORMAT_VERSION
}

/// Serialized bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(default)]
    pub feature_version: Option<u8>,
    #[serde(default)]
    pub layout_hash: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub model: IsolationForest,
    /// Missing or null means the bundle carries no fitted statistics
    #[serde(default, deserialize_with = "scaler_or_default")]
    pub scaler: StandardScaler,
}

fn scaler_or_default<'de, D>(deserializer: D) -> Result<StandardScaler, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<StandardScaler>::deserialize(deserializer)?.unwrap_or_default())
}

impl ModelBundle {
    /// Bundle stamped with the current layout
    pub fn new(model: IsolationForest, scaler: StandardScaler) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_version: Some(FEATURE_VERSION),
            layout_hash: Some(layout_hash()),
            created_at: Some(Utc::now()),
            model,
            scaler,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactFile {
    Bundle(Box<ModelBundle>),
    Legacy(Box<IsolationForest>),
}

/// Artifact after format resolution and validation
#[derive(Debug, Clone)]
pub enum LoadedArtifact {
    Bundle {
        model: IsolationForest,
        scaler: StandardScaler,
    },
    Legacy {
        model: IsolationForest,
    },
}

/// SHA-256 of the artifact bytes, hex encoded
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Decode and validate artifact bytes
pub fn decode(bytes: &[u8]) -> Result<LoadedArtifact, ArtifactError> {
    let file: ArtifactFile = serde_json::from_slice(bytes)?;

    match file {
        ArtifactFile::Bundle(bundle) => {
            let bundle = *bundle;
            if bundle.format_version > ARTIFACT_FORMAT_VERSION {
                return Err(ArtifactError::Invalid(format!(
                    "unsupported format version {}",
                    bundle.format_version
                )));
            }
            if let (Some(version), Some(hash)) = (bundle.feature_version, bundle.layout_hash) {
                validate_layout(version, hash)?;
            }
            validate_model(&bundle.model)?;
            if let Some(stats) = &bundle.scaler.stats {
                if stats.mean.len() != FEATURE_COUNT || stats.scale.len() != FEATURE_COUNT {
                    return Err(ArtifactError::Invalid(format!(
                        "scaler has {} columns, expected {}",
                        stats.mean.len(),
                        FEATURE_COUNT
                    )));
                }
                if stats.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                    return Err(ArtifactError::Invalid("scaler has a zero or non-finite scale".to_string()));
                }
            }
            Ok(LoadedArtifact::Bundle {
                model: bundle.model,
                scaler: bundle.scaler,
            })
        }
        ArtifactFile::Legacy(model) => {
            validate_model(&model)?;
            Ok(LoadedArtifact::Legacy { model: *model })
        }
    }
}

fn validate_model(model: &IsolationForest) -> Result<(), ArtifactError> {
    model.validate()?;
    if model.n_features != FEATURE_COUNT {
        return Err(ArtifactError::Invalid(format!(
            "model expects {} features, layout has {}",
            model.n_features, FEATURE_COUNT
        )));
    }
    Ok(())
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn read_with_retry(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut attempt = 1;
    loop {
        match fs::read(path) {
            Ok(bytes) => return Ok(bytes),
            Err(e) if is_transient(e.kind()) && attempt < READ_ATTEMPTS => {
                log::debug!("Artifact read attempt {} failed ({}), retrying", attempt, e);
                thread::sleep(Duration::from_millis(50 * attempt as u64));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Read, decode and validate an artifact; also returns its digest
pub fn read_artifact(path: &Path) -> Result<(LoadedArtifact, String), ArtifactError> {
    let bytes = read_with_retry(path)?;
    let artifact = decode(&bytes)?;
    Ok((artifact, digest(&bytes)))
}

/// Write a bundle, creating parent directories. Returns the digest.
pub fn save_bundle(
    path: &Path,
    model: &IsolationForest,
    scaler: &StandardScaler,
) -> Result<String, ArtifactError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bundle = ModelBundle::new(model.clone(), scaler.clone());
    let json = serde_json::to_vec(&bundle)?;
    fs::write(path, &json)?;
    Ok(digest(&json))
}

/// Write a bare model in the legacy shape
pub fn save_legacy(path: &Path, model: &IsolationForest) -> Result<String, ArtifactError> {
    let json = serde_json::to_vec(model)?;
    fs::write(path, &json)?;
    Ok(digest(&json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::forest::ForestParams;
    use crate::logic::model::scaler::ScalerStats;
    use ndarray::Array2;

    fn params() -> ForestParams {
        ForestParams { n_estimators: 10, max_samples: 32, ..Default::default() }
    }

    fn fitted_pair() -> (IsolationForest, StandardScaler) {
        let data = Array2::from_shape_fn((64, FEATURE_COUNT), |(i, j)| (i * (j + 1)) as f64);
        let stats = ScalerStats::fit(&data).unwrap();
        let scaled = stats.transform(&data).unwrap();
        let model = IsolationForest::fit(&scaled, &params()).unwrap();
        (model, StandardScaler::fitted(stats))
    }

    #[test]
    fn test_bundle_save_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let (model, scaler) = fitted_pair();

        let written = save_bundle(&path, &model, &scaler).unwrap();
        let (loaded, read_digest) = read_artifact(&path).unwrap();

        assert_eq!(written, read_digest);
        match loaded {
            LoadedArtifact::Bundle { model: m, scaler: s } => {
                assert_eq!(m, model);
                assert_eq!(s, scaler);
            }
            other => panic!("expected bundle, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_bare_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let (model, _) = fitted_pair();
        save_legacy(&path, &model).unwrap();

        let (loaded, _) = read_artifact(&path).unwrap();
        assert!(matches!(loaded, LoadedArtifact::Legacy { .. }));
    }

    #[test]
    fn test_bundle_with_null_scaler() {
        let (model, _) = fitted_pair();
        let json = serde_json::json!({ "model": model, "scaler": null });
        let loaded = decode(json.to_string().as_bytes()).unwrap();
        match loaded {
            LoadedArtifact::Bundle { scaler, .. } => assert!(!scaler.is_fitted()),
            other => panic!("expected bundle, got {:?}", other),
        }
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let (model, scaler) = fitted_pair();
        let mut bundle = ModelBundle::new(model, scaler);
        bundle.layout_hash = Some(layout_hash() ^ 0xFFFF);
        let bytes = serde_json::to_vec(&bundle).unwrap();

        assert!(matches!(decode(&bytes), Err(ArtifactError::LayoutMismatch(_))));
    }

    #[test]
    fn test_wrong_feature_count_rejected() {
        let data = Array2::from_shape_fn((32, 2), |(i, j)| (i + j) as f64);
        let model = IsolationForest::fit(&data, &params()).unwrap();
        let bytes = serde_json::to_vec(&model).unwrap();

        assert!(matches!(decode(&bytes), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(decode(b"not json at all"), Err(ArtifactError::Decode(_))));
        assert!(matches!(decode(br#"{"model": 3}"#), Err(ArtifactError::Decode(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        match read_artifact(&dir.path().join("absent.json")) {
            Err(ArtifactError::Io(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }
}
