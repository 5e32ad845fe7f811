//! Model info and reload handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use fraudshield_core::ModelInfo;

use crate::{AppResult, AppState};

/// Active model metadata, loading it first if needed
pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    let registry = Arc::clone(&state.registry);
    let active = tokio::task::spawn_blocking(move || registry.ensure_loaded()).await?;
    Ok(Json(active.info.clone()))
}

/// Reload from the configured path; always ends with a usable model
pub async fn reload(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    let registry = Arc::clone(&state.registry);
    let active = tokio::task::spawn_blocking(move || registry.reload()).await?;

    tracing::info!(
        source = active.source().name(),
        digest = ?active.info.digest,
        "Model reloaded"
    );
    Ok(Json(active.info.clone()))
}
