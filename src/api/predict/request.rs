// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload extraction

use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use crate::api::errors::ApiError;

/// Form field carrying the image
pub const UPLOAD_FIELD: &str = "file";

/// Read the first `file` field of the form
///
/// Other fields are skipped. A missing or zero-byte field is an
/// `InvalidUpload`.
pub async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidUpload(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidUpload(format!("failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(ApiError::InvalidUpload(format!(
                "field '{}' is empty",
                UPLOAD_FIELD
            )));
        }

        debug!("Received upload {:?}: {} bytes", file_name, bytes.len());
        return Ok(bytes);
    }

    Err(ApiError::InvalidUpload(format!(
        "missing field '{}'",
        UPLOAD_FIELD
    )))
}
