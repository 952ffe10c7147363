// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// src/monitoring/mod.rs - Logging setup

pub mod logging;

pub use logging::{init_logging, log_file_name};
