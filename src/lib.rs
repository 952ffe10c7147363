// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod monitoring;
pub mod version;
pub mod vision;

// Re-export main types
pub use api::{create_router, serve, ApiError, AppState, PredictResponse};
pub use config::{Device, ServiceConfig};
pub use vision::{
    classify, BoundingBox, Detection, DetectionModelConfig, DetectionModelManager, ObjectDetector,
    OnnxDetector, Point, Quadrant, QuadrantResult,
};
