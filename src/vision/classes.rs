// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class-name list loading

use anyhow::{Context, Result};
use std::path::Path;

/// Read one class name per line, skipping blank lines
pub fn load_class_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read class names from {}", path.display()))?;

    Ok(parse_class_names(&content))
}

pub fn parse_class_names(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
