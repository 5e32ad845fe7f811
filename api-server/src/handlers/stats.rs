//! Detection statistics handler

use axum::{extract::State, Json};
use fraudshield_core::DetectionSnapshot;

use crate::AppState;

pub async fn get(State(state): State<AppState>) -> Json<DetectionSnapshot> {
    Json(state.engine.stats())
}
