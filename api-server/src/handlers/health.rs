//! Health check handlers

use axum::{extract::State, Json};
use fraudshield_core::constants::{APP_NAME, APP_VERSION};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model_loaded: bool,
    model_source: Option<&'static str>,
    timestamp: i64,
}

/// Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": APP_NAME,
        "version": APP_VERSION,
        "endpoints": {
            "detect": "POST /api/v1/detect",
            "upload": "POST /api/v1/upload",
            "stats": "GET /api/v1/stats",
            "model": "GET /api/v1/model",
            "health": "GET /health"
        }
    }))
}

/// Degraded while no model is loaded or an untrained one is active
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let active = state.registry.snapshot();
    let healthy = active.as_ref().is_some_and(|a| !a.source().is_fresh());

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        version: APP_VERSION,
        model_loaded: active.is_some(),
        model_source: active.as_ref().map(|a| a.source().name()),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
