// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect, classify, and optionally dump the debug overlay

use anyhow::Result;
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

use super::detector::{Detection, ObjectDetector};
use super::overlay::{draw_detections, save_overlay};
use super::quadrant::{classify, QuadrantResult};

/// Outcome of one prediction
#[derive(Debug, Clone)]
pub struct QuadrantPrediction {
    pub detections: Vec<Detection>,
    pub quadrants: QuadrantResult,
    pub processing_time_ms: u64,
}

/// Run the detector and classify its boxes
///
/// When `debug_image` is set the overlay is written there. A failed write is
/// logged and does not fail the prediction.
pub fn predict_quadrants(
    detector: &dyn ObjectDetector,
    image: &DynamicImage,
    debug_image: Option<&Path>,
) -> Result<QuadrantPrediction> {
    let start = Instant::now();
    let (width, height) = image.dimensions();

    let detections = detector.detect(image)?;
    let quadrants = classify(width, height, &detections);

    debug!(
        "{} detections -> {} quadrants on {}x{} image",
        detections.len(),
        quadrants.len(),
        width,
        height
    );

    if let Some(path) = debug_image {
        let canvas = draw_detections(image, &detections, &quadrants);
        if let Err(e) = save_overlay(path, &canvas) {
            warn!("Failed to write debug image: {:#}", e);
        }
    }

    Ok(QuadrantPrediction {
        detections,
        quadrants,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}
