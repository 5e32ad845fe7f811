//! FraudShield API Server
//!
//! HTTP front end for the transaction scoring engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  FRAUDSHIELD API                     │
//! ├──────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────┐  │
//! │  │  Router   │──▶│ ScoringEngine│──▶│ModelRegistry│  │
//! │  │  (Axum)   │   │ (blocking)   │   │ (Arc swap)  │  │
//! │  └───────────┘   └──────────────┘   └──────┬──────┘  │
//! │                                            ▼         │
//! │                                   model artifact     │
//! └──────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod models;


use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use fraudshield_core::{ModelRegistry, ScoringEngine};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

/// Upper bound for uploaded CSV bodies
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (core `log` records are bridged in)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fraudshield_api=debug,fraudshield_core=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("FraudShield API starting ({})...", config.environment);
    tracing::info!("Model path: {}", config.engine.model_path.display());

    let state = AppState::new(config.clone());
    let engine_config = state.engine.config();
    tracing::info!(
        "Scoring: threshold {}, scaling {}, ids {}",
        engine_config.policy.threshold,
        engine_config.scaling_mode,
        engine_config.id_strategy
    );

    // Load the model before serving
    let registry = Arc::clone(&state.registry);
    let path = config.engine.model_path.clone();
    let active = tokio::task::spawn_blocking(move || registry.load(path)).await?;
    if active.source().is_fresh() {
        tracing::warn!("Serving with an untrained model, scores are not meaningful");
    } else {
        tracing::info!("Model ready ({}, {} trees)", active.source().name(), active.info.n_estimators);
    }
    if config.is_production() && active.source().is_fresh() {
        tracing::error!("No trained model available in production");
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoringEngine>,
    pub registry: Arc<ModelRegistry>,
    pub config: config::Config,
}

impl AppState {
    /// Registry is created unloaded
    pub fn new(config: config::Config) -> Self {
        let registry = Arc::new(ModelRegistry::new(
            config.engine.forest.clone(),
            &config.engine.model_path,
        ));
        let engine = Arc::new(ScoringEngine::new(Arc::clone(&registry), config.engine.clone()));
        Self { engine, registry, config }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/health", get(handlers::health::check))
        .route("/api/v1/detect", post(handlers::detect::detect))
        .route(
            "/api/v1/upload",
            post(handlers::detect::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/stats", get(handlers::stats::get))
        .route("/api/v1/model", get(handlers::model::info))
        .route("/api/v1/model/reload", post(handlers::model::reload));

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
