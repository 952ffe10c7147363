// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health tests

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use image::DynamicImage;
use quadrant_detector::api::{create_router, AppState};
use quadrant_detector::version;
use quadrant_detector::vision::{Detection, ObjectDetector};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

struct NoopDetector;

impl ObjectDetector for NoopDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        Ok(vec![])
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[tokio::test]
async fn test_health_reports_model_and_version() {
    let state = AppState::with_detector(Arc::new(NoopDetector), 3);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"]["version"], version::VERSION_NUMBER);
    assert_eq!(json["version"]["build"], version::VERSION);
    let features = json["version"]["features"].as_array().unwrap();
    assert!(features.iter().any(|f| f == "quadrant-classification"));
    assert_eq!(json["model"]["name"], "noop");
    assert_eq!(json["available_slots"], 3);
}

#[tokio::test]
async fn test_predict_rejects_get() {
    let state = AppState::with_detector(Arc::new(NoopDetector), 1);
    let request = Request::builder()
        .uri("/predict")
        .body(Body::empty())
        .unwrap();

    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
