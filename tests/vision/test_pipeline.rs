// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detector -> classifier pipeline through the model manager

use anyhow::Result;
use image::{DynamicImage, RgbImage};
use quadrant_detector::vision::{
    predict_quadrants, BoundingBox, Detection, DetectionModelManager, ObjectDetector, Point,
};
use std::sync::Arc;

struct CornerDetector;

impl ObjectDetector for CornerDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let (w, h) = (image.width() as i32, image.height() as i32);
        Ok(vec![
            Detection {
                bbox: BoundingBox {
                    x1: 0,
                    y1: 0,
                    x2: 4,
                    y2: 4,
                },
                score: 0.9,
                label: "top_left".to_string(),
            },
            Detection {
                bbox: BoundingBox {
                    x1: w - 4,
                    y1: h - 4,
                    x2: w,
                    y2: h,
                },
                score: 0.9,
                label: "bottom_right".to_string(),
            },
        ])
    }

    fn name(&self) -> &str {
        "corner"
    }
}

#[test]
fn test_pipeline_through_manager() {
    let manager = DetectionModelManager::from_detector(
        Arc::new(CornerDetector),
        vec!["top_left".to_string(), "bottom_right".to_string()],
        0.5,
    );
    let image = DynamicImage::ImageRgb8(RgbImage::new(40, 30));

    let detector = manager.detector();
    let prediction = predict_quadrants(detector.as_ref(), &image, None).unwrap();

    assert_eq!(prediction.detections.len(), 2);
    assert_eq!(prediction.quadrants.top_left, Some(Point::new(2, 2)));
    assert_eq!(prediction.quadrants.bottom_right, Some(Point::new(38, 28)));
    assert!(prediction.quadrants.top_right.is_none());
    assert!(prediction.quadrants.bottom_left.is_none());
}

#[test]
fn test_unwritable_debug_path_does_not_fail() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where a directory is expected
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    let debug_path = blocker.join("overlay.png");

    let image = DynamicImage::ImageRgb8(RgbImage::new(20, 20));
    let prediction = predict_quadrants(&CornerDetector, &image, Some(&debug_path)).unwrap();

    assert_eq!(prediction.quadrants.len(), 2);
    assert!(!debug_path.exists());
}
