// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detector;
pub mod service;

pub use detector::{DetectorModelConfig, InputFormat};
pub use service::{ConfigError, Device, ServiceConfig, DEFAULT_MAX_UPLOAD_BYTES};
