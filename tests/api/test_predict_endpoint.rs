// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /predict tests
//!
//! The router is driven with `oneshot` and stub detectors, so no model
//! weights are needed.

use anyhow::{bail, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use quadrant_detector::api::{create_router, AppState};
use quadrant_detector::vision::{BoundingBox, Detection, ObjectDetector};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "quadrant-test-boundary";

struct FixedDetector {
    detections: Vec<Detection>,
}

impl ObjectDetector for FixedDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct FailingDetector;

impl ObjectDetector for FailingDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        bail!("onnx session exploded")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn detection(x1: i32, y1: i32, x2: i32, y2: i32) -> Detection {
    Detection {
        bbox: BoundingBox { x1, y1, x2, y2 },
        score: 0.9,
        label: "marker".to_string(),
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |_, _| Rgb([128u8, 128u8, 128u8]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Build a multipart body from (field name, file bytes) pairs
fn multipart_body(fields: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.png\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn predict_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn state_with(detections: Vec<Detection>) -> AppState {
    AppState::with_detector(Arc::new(FixedDetector { detections }), 4)
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn test_predict_returns_four_quadrant_points() {
    let state = state_with(vec![
        detection(10, 10, 30, 30),
        detection(80, 10, 90, 30),
        detection(80, 80, 90, 90),
        detection(10, 80, 30, 90),
    ]);
    let png = png_bytes(100, 100);

    let body = multipart_body(&[("file", png.as_slice())]);
    let (status, json) = send(state, predict_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["point_tl"], serde_json::json!([20, 20]));
    assert_eq!(json["point_tr"], serde_json::json!([85, 20]));
    assert_eq!(json["point_br"], serde_json::json!([85, 85]));
    assert_eq!(json["point_bl"], serde_json::json!([20, 85]));
}

#[tokio::test]
async fn test_predict_body_has_exactly_four_keys() {
    let state = state_with(vec![detection(40, 40, 60, 60)]);
    let png = png_bytes(100, 100);

    let body = multipart_body(&[("file", png.as_slice())]);
    let (status, json) = send(state, predict_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 4);
    for key in ["point_tl", "point_tr", "point_bl", "point_br"] {
        assert!(object.contains_key(key), "missing key {}", key);
    }

    // Center tie goes to bottom-left
    assert_eq!(json["point_bl"], serde_json::json!([50, 50]));
    assert!(json["point_tl"].is_null());
    assert!(json["point_tr"].is_null());
    assert!(json["point_br"].is_null());
}

#[tokio::test]
async fn test_predict_no_detections_all_null() {
    let png = png_bytes(64, 48);

    let (status, json) = send(
        state_with(vec![]),
        predict_request(multipart_body(&[("file", png.as_slice())])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    for key in ["point_tl", "point_tr", "point_bl", "point_br"] {
        assert!(json[key].is_null());
    }
}

#[tokio::test]
async fn test_predict_skips_unrelated_fields() {
    let state = state_with(vec![detection(0, 0, 10, 10)]);
    let png = png_bytes(100, 100);

    let body = multipart_body(&[("comment", b"hello".as_slice()), ("file", png.as_slice())]);
    let (status, json) = send(state, predict_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["point_tl"], serde_json::json!([5, 5]));
}

#[tokio::test]
async fn test_missing_file_field_is_invalid_upload() {
    let body = multipart_body(&[("image", b"not the right field".as_slice())]);
    let (status, json) = send(state_with(vec![]), predict_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_upload");
}

#[tokio::test]
async fn test_empty_file_is_invalid_upload() {
    let body = multipart_body(&[("file", b"".as_slice())]);
    let (status, json) = send(state_with(vec![]), predict_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_upload");
}

#[tokio::test]
async fn test_non_multipart_request_is_invalid_upload() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, json) = send(state_with(vec![]), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_upload");
}

#[tokio::test]
async fn test_garbage_bytes_are_undecodable() {
    let body = multipart_body(&[("file", b"definitely not an image".as_slice())]);
    let (status, json) = send(state_with(vec![]), predict_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "undecodable_image");
}

#[tokio::test]
async fn test_truncated_png_is_undecodable() {
    let png = png_bytes(32, 32);
    let truncated = &png[..png.len() / 2];

    let body = multipart_body(&[("file", truncated)]);
    let (status, json) = send(state_with(vec![]), predict_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "undecodable_image");
}

#[tokio::test]
async fn test_detector_failure_is_server_error() {
    let state = AppState::with_detector(Arc::new(FailingDetector), 4);
    let png = png_bytes(100, 100);

    let body = multipart_body(&[("file", png.as_slice())]);
    let (status, json) = send(state, predict_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error_type"], "model_inference_failure");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("onnx session exploded"));
}

#[tokio::test]
async fn test_full_inference_gate_returns_503() {
    let state = state_with(vec![]);
    let _held = state.inference_gate.clone().try_acquire_many_owned(4).unwrap();
    let png = png_bytes(100, 100);

    let body = multipart_body(&[("file", png.as_slice())]);
    let (status, json) = send(state, predict_request(body)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error_type"], "service_busy");
}

#[tokio::test]
async fn test_permit_released_after_request() {
    let state = AppState::with_detector(Arc::new(FixedDetector { detections: vec![] }), 1);
    let png = png_bytes(16, 16);

    for _ in 0..3 {
        let (status, _) = send(
            state.clone(),
            predict_request(multipart_body(&[("file", png.as_slice())])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(state.inference_gate.available_permits(), 1);
}

#[tokio::test]
async fn test_debug_image_written_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let debug_path = dir.path().join("debug").join("overlay.png");

    let mut state = state_with(vec![detection(10, 10, 30, 30)]);
    state.debug_image = Some(debug_path.clone());
    let png = png_bytes(100, 100);

    let body = multipart_body(&[("file", png.as_slice())]);
    let (status, _) = send(state, predict_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(debug_path.exists());
}

#[tokio::test]
async fn test_body_over_request_limit_is_invalid_upload() {
    let mut state = state_with(vec![]);
    state.max_upload_bytes = 1024;

    // Well past max_upload_bytes plus the multipart allowance
    let oversized = vec![0u8; 200 * 1024];
    let body = multipart_body(&[("file", oversized.as_slice())]);
    let (status, json) = send(state, predict_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_upload");
}

#[tokio::test]
async fn test_file_over_upload_limit_is_undecodable() {
    let mut state = state_with(vec![]);
    state.max_upload_bytes = 1024;

    // Fits the request body limit but not the image limit
    let mut png = png_bytes(8, 8);
    png.resize(4 * 1024, 0);
    let body = multipart_body(&[("file", png.as_slice())]);
    let (status, json) = send(state, predict_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "undecodable_image");
    assert!(json["message"].as_str().unwrap().contains("too large"));
}
