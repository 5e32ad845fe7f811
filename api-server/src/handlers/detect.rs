//! Detection handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use fraudshield_core::logic::ingest;
use fraudshield_core::Transaction;
use validator::Validate;

use crate::models::{DetectionRequest, DetectionResponse};
use crate::{AppError, AppResult, AppState};

/// Score a JSON batch of transactions
pub async fn detect(
    State(state): State<AppState>,
    Json(req): Json<DetectionRequest>,
) -> AppResult<Json<DetectionResponse>> {
    req.validate()?;

    let transactions: Vec<Transaction> = req.transactions.into_iter().map(Transaction::from).collect();
    let engine = Arc::clone(&state.engine);
    let results = tokio::task::spawn_blocking(move || engine.detect_batch(&transactions)).await??;

    let response = DetectionResponse::from(results);
    tracing::info!(
        total = response.total_transactions,
        fraud = response.fraud_count,
        "Detection completed"
    );
    Ok(Json(response))
}

/// Score an uploaded CSV file (multipart field `file`)
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<DetectionResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(AppError::BadRequest("Only CSV files are supported".to_string()));
        }

        let bytes = field.bytes().await?;
        let engine = Arc::clone(&state.engine);
        let results = tokio::task::spawn_blocking(move || -> AppResult<_> {
            let transactions = ingest::read_transactions(bytes.as_ref())?;
            Ok(engine.detect_batch(&transactions)?)
        })
        .await??;

        let response = DetectionResponse::from(results);
        tracing::info!(
            file = %filename,
            total = response.total_transactions,
            fraud = response.fraud_count,
            "CSV detection completed"
        );
        return Ok(Json(response));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}
