// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict API endpoint module
//!
//! Provides POST /predict for locating one detection center per quadrant.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::predict_handler;
pub use request::{read_file_field, UPLOAD_FIELD};
pub use response::PredictResponse;
