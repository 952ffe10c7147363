// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict response types

use serde::{Deserialize, Serialize};

use crate::vision::{Point, QuadrantResult};

/// Body of a successful prediction
///
/// Each field is `[x, y]` or `null`; all four keys are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub point_tl: Option<Point>,
    pub point_tr: Option<Point>,
    pub point_bl: Option<Point>,
    pub point_br: Option<Point>,
}

impl From<QuadrantResult> for PredictResponse {
    fn from(result: QuadrantResult) -> Self {
        Self {
            point_tl: result.top_left,
            point_tr: result.top_right,
            point_bl: result.bottom_left,
            point_br: result.bottom_right,
        }
    }
}
