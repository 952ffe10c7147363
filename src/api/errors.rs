// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vision::ImageError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No `file` field, or the field is empty
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Undecodable image: {0}")]
    UndecodableImage(String),

    #[error("Model inference failed: {0}")]
    ModelInferenceFailure(String),

    #[error("Service busy: {0}")]
    ServiceBusy(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidUpload(_) => "invalid_upload",
            ApiError::UndecodableImage(_) => "undecodable_image",
            ApiError::ModelInferenceFailure(_) => "model_inference_failure",
            ApiError::ServiceBusy(_) => "service_busy",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidUpload(_) | ApiError::UndecodableImage(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelInferenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ApiError::InvalidUpload(msg)
            | ApiError::UndecodableImage(msg)
            | ApiError::ModelInferenceFailure(msg)
            | ApiError::ServiceBusy(msg) => msg.clone(),
        };

        ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::EmptyData => ApiError::InvalidUpload("file is empty".to_string()),
            other => ApiError::UndecodableImage(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
