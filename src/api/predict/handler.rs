// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{debug, info, warn};

use super::request::read_file_field;
use super::response::PredictResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode_image_bytes_with_limit, predict_quadrants};

/// POST /predict - Locate one detection center per image quadrant
///
/// # Request
/// - multipart form, field `file`: the image (PNG, JPEG, WebP, GIF, BMP, TIFF)
///
/// # Response
/// - `point_tl`, `point_tr`, `point_bl`, `point_br`: `[x, y]` or `null`
///
/// # Errors
/// - 400 `invalid_upload`: no `file` field, or it is empty
/// - 400 `undecodable_image`: bytes are not a decodable image
/// - 503 `service_busy`: too many predictions in flight
/// - 500 `model_inference_failure`: the detector failed
pub async fn predict_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        warn!("Predict request is not multipart: {}", e);
        ApiError::InvalidUpload(e.to_string())
    })?;

    let upload = read_file_field(multipart).await.map_err(|e| {
        warn!("Rejected upload: {}", e);
        e
    })?;

    let permit = state.inference_gate.clone().try_acquire_owned().map_err(|_| {
        warn!("Inference gate full, rejecting request");
        ApiError::ServiceBusy("too many predictions in flight, retry later".to_string())
    })?;

    let detector = state.model_manager.detector();
    let debug_image = state.debug_image.clone();
    let max_bytes = state.max_upload_bytes;

    let prediction = tokio::task::spawn_blocking(move || {
        let _permit = permit;

        let (image, image_info) = decode_image_bytes_with_limit(&upload, max_bytes)?;
        debug!(
            "Decoded image: {}x{} {:?}, {} bytes",
            image_info.width, image_info.height, image_info.format, image_info.size_bytes
        );

        predict_quadrants(detector.as_ref(), &image, debug_image.as_deref())
            .map_err(|e| ApiError::ModelInferenceFailure(format!("{:#}", e)))
    })
    .await
    .map_err(|e| ApiError::ModelInferenceFailure(format!("inference task failed: {}", e)))?
    .map_err(|e| {
        warn!("Prediction failed: {}", e);
        e
    })?;

    info!(
        "Prediction complete: {} detections, {} quadrants, {}ms",
        prediction.detections.len(),
        prediction.quadrants.len(),
        prediction.processing_time_ms
    );

    Ok(Json(PredictResponse::from(prediction.quadrants)))
}
