// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::PathBuf;

/// Quadrant detector HTTP service
#[derive(Parser, Debug)]
#[command(name = "quadrant-detector")]
#[command(version)]
#[command(about = "Serve object-detection quadrant predictions over HTTP", long_about = None)]
pub struct Cli {
    /// Path to the service TOML configuration
    #[arg(long, env = "QUADRANT_CONFIG", default_value = "configs/service.toml")]
    pub config: PathBuf,
}
