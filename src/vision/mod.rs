// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing: detection and quadrant classification
//!
//! This module provides:
//! - The object-detection adapter (ONNX Runtime)
//! - Geometric quadrant classification of detection centers
//! - Upload decoding and the debug overlay

pub mod classes;
pub mod detector;
pub mod image_utils;
pub mod model_manager;
pub mod overlay;
pub mod pipeline;
pub mod quadrant;

pub use classes::load_class_names;
pub use detector::{BoundingBox, Detection, ObjectDetector, OnnxDetector};
pub use image_utils::{decode_image_bytes, decode_image_bytes_with_limit, ImageError, ImageInfo};
pub use model_manager::{DetectionModelConfig, DetectionModelInfo, DetectionModelManager};
pub use pipeline::{predict_quadrants, QuadrantPrediction};
pub use quadrant::{classify, image_center, Point, Quadrant, QuadrantResult};
