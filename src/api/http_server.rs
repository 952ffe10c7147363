// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::{future::Future, path::PathBuf, sync::Arc};
use tokio::{net::TcpListener, sync::Semaphore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::predict::predict_handler;
use crate::config::{ServiceConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::version;
use crate::vision::{DetectionModelInfo, DetectionModelManager, ObjectDetector};

/// Extra room on top of the image limit for multipart framing
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub model_manager: Arc<DetectionModelManager>,
    /// Bounds predictions holding an image at once
    pub inference_gate: Arc<Semaphore>,
    pub debug_image: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(model_manager: Arc<DetectionModelManager>, config: &ServiceConfig) -> Self {
        Self {
            model_manager,
            inference_gate: Arc::new(Semaphore::new(config.max_pending_inferences)),
            debug_image: config.debug_image.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// State around an arbitrary detector with default limits
    pub fn with_detector(detector: Arc<dyn ObjectDetector>, max_pending_inferences: usize) -> Self {
        let manager = DetectionModelManager::from_detector(detector, Vec::new(), 0.0);
        Self {
            model_manager: Arc::new(manager),
            inference_gate: Arc::new(Semaphore::new(max_pending_inferences)),
            debug_image: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Version, build tag, date and feature list
    pub version: serde_json::Value,
    pub model: DetectionModelInfo,
    pub available_slots: usize,
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    tracing::info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: version::get_version_info(),
        model: state.model_manager.model_info().clone(),
        available_slots: state.inference_gate.available_permits(),
    })
}
