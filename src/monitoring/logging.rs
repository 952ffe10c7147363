// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide tracing setup
//!
//! Two sinks: a timestamped DEBUG-level file under the configured log
//! directory, and ERROR-level output on stderr.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, Layer};

/// `2025-11-03_14-05-09.417.log`
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("{}.log", now.format("%Y-%m-%d_%H-%M-%S%.3f"))
}

/// Install the global subscriber and return the log file path
pub fn init_logging(log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join(log_file_name(Local::now()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_filter(LevelFilter::DEBUG);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::ERROR);

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    Ok(log_path)
}
