// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection adapter
//!
//! Components:
//! - `onnx` - ONNX Runtime detector for detectron2 tracing exports
//! - `preprocessing` - Shortest-edge resize and CHW tensor conversion

pub mod onnx;
pub mod preprocessing;

use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub use onnx::OnnxDetector;

/// Axis-aligned box in pixel coordinates of the uploaded image
///
/// Origin is top-left with y growing downward; `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// One detector output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Confidence score (0.0-1.0)
    pub score: f32,
    /// Class name from the class list
    pub label: String,
}

/// Anything that can turn a decoded image into detections
///
/// Implementations are shared read-only across requests, so `detect` takes
/// `&self` and must be safe to call from the blocking pool.
pub trait ObjectDetector: Send + Sync {
    /// Detections above the confidence threshold, in model output order
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;

    /// Short name reported by the health endpoint
    fn name(&self) -> &str;
}
