// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Quadrant classification of detection centers
//!
//! The image is split into four regions by the lines through its pixel
//! center. Each detection center lands in exactly one region; points on
//! either center line fall through to bottom-left.

use serde::{Deserialize, Serialize};

use super::detector::{BoundingBox, Detection};

/// Integer pixel coordinate, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(point: Point) -> Self {
        (point.x, point.y)
    }
}

/// One of the four image regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Classify `center` against `image_center`
    ///
    /// Only strict comparisons select top-left, top-right and bottom-right.
    /// Everything else, including ties on either axis, is bottom-left.
    pub fn of(center: Point, image_center: Point) -> Self {
        let left = center.x < image_center.x;
        let right = center.x > image_center.x;
        let above = center.y < image_center.y;
        let below = center.y > image_center.y;

        if left && above {
            Quadrant::TopLeft
        } else if right && above {
            Quadrant::TopRight
        } else if right && below {
            Quadrant::BottomRight
        } else {
            Quadrant::BottomLeft
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::TopLeft => "top_left",
            Quadrant::TopRight => "top_right",
            Quadrant::BottomLeft => "bottom_left",
            Quadrant::BottomRight => "bottom_right",
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Center point selected for each quadrant, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadrantResult {
    pub top_left: Option<Point>,
    pub top_right: Option<Point>,
    pub bottom_left: Option<Point>,
    pub bottom_right: Option<Point>,
}

impl QuadrantResult {
    pub fn get(&self, quadrant: Quadrant) -> Option<Point> {
        match quadrant {
            Quadrant::TopLeft => self.top_left,
            Quadrant::TopRight => self.top_right,
            Quadrant::BottomLeft => self.bottom_left,
            Quadrant::BottomRight => self.bottom_right,
        }
    }

    fn set(&mut self, quadrant: Quadrant, point: Point) {
        let slot = match quadrant {
            Quadrant::TopLeft => &mut self.top_left,
            Quadrant::TopRight => &mut self.top_right,
            Quadrant::BottomLeft => &mut self.bottom_left,
            Quadrant::BottomRight => &mut self.bottom_right,
        };
        *slot = Some(point);
    }

    /// Number of quadrants with a point
    pub fn len(&self) -> usize {
        Quadrant::ALL
            .iter()
            .filter(|q| self.get(**q).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BoundingBox {
    /// Box center using floor halving of width and height
    pub fn center(&self) -> Point {
        Point {
            x: self.x1 + (self.x2 - self.x1).div_euclid(2),
            y: self.y1 + (self.y2 - self.y1).div_euclid(2),
        }
    }
}

/// Pixel center of a `width` x `height` image
pub fn image_center(width: u32, height: u32) -> Point {
    Point {
        x: (width / 2) as i32,
        y: (height / 2) as i32,
    }
}

/// Assign every detection center to a quadrant
///
/// When several detections share a quadrant the last one in `detections`
/// order is kept.
pub fn classify(image_width: u32, image_height: u32, detections: &[Detection]) -> QuadrantResult {
    let center = image_center(image_width, image_height);
    let mut result = QuadrantResult::default();

    for detection in detections {
        let point = detection.bbox.center();
        result.set(Quadrant::of(point, center), point);
    }

    result
}
