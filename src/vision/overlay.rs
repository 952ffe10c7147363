// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Debug overlay: detection boxes and the chosen quadrant points

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_hollow_rect_mut},
    rect::Rect,
};
use std::path::Path;

use super::detector::{BoundingBox, Detection};
use super::quadrant::{Quadrant, QuadrantResult};

const PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 0, 0]),
    Rgb([0, 200, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 165, 0]),
    Rgb([200, 0, 200]),
    Rgb([0, 200, 200]),
];

const POINT_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

fn label_color(label: &str) -> Rgb<u8> {
    let hash = label
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    PALETTE[hash % PALETTE.len()]
}

fn rect_from_bbox(bbox: &BoundingBox, img_w: u32, img_h: u32) -> Option<Rect> {
    if img_w == 0 || img_h == 0 {
        return None;
    }
    let max_x = img_w as i32 - 1;
    let max_y = img_h as i32 - 1;

    let x1 = bbox.x1.clamp(0, max_x);
    let y1 = bbox.y1.clamp(0, max_y);
    let x2 = bbox.x2.clamp(0, max_x);
    let y2 = bbox.y2.clamp(0, max_y);

    let width = (x2 - x1).max(1) as u32;
    let height = (y2 - y1).max(1) as u32;

    Some(Rect::at(x1, y1).of_size(width, height))
}

/// Render boxes (colored by label) and quadrant points onto a copy
pub fn draw_detections(
    image: &DynamicImage,
    detections: &[Detection],
    result: &QuadrantResult,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (img_w, img_h) = canvas.dimensions();
    let radius = ((img_w.min(img_h) / 100).max(2)) as i32;

    for detection in detections {
        if let Some(rect) = rect_from_bbox(&detection.bbox, img_w, img_h) {
            draw_hollow_rect_mut(&mut canvas, rect, label_color(&detection.label));
        }
    }

    for quadrant in Quadrant::ALL {
        if let Some(point) = result.get(quadrant) {
            draw_filled_circle_mut(&mut canvas, (point.x, point.y), radius, POINT_COLOR);
        }
    }

    canvas
}

/// Write the overlay, replacing any previous file at `path`
///
/// The image is encoded into a temporary file in the same directory and
/// renamed over `path`, so readers never see a partial write.
pub fn save_overlay(path: &Path, image: &RgbImage) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unsupported debug image extension {}", path.display()))?;

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".overlay-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;

    image
        .write_to(tmp.as_file_mut(), format)
        .with_context(|| format!("failed to encode debug image {}", path.display()))?;

    tmp.persist(path)
        .with_context(|| format!("failed to save debug image {}", path.display()))?;

    Ok(())
}
