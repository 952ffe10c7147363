// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detector model configuration (tensor names and test-time resize)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Channel order the exported graph expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputFormat {
    Rgb,
    Bgr,
}

fn default_input_name() -> String {
    "image".to_string()
}

fn default_boxes_output() -> String {
    "boxes".to_string()
}

fn default_scores_output() -> String {
    "scores".to_string()
}

fn default_classes_output() -> String {
    "classes".to_string()
}

fn default_min_size_test() -> u32 {
    800
}

fn default_max_size_test() -> u32 {
    1333
}

fn default_input_format() -> InputFormat {
    InputFormat::Bgr
}

/// Layout of an exported detection graph
///
/// Defaults match a detectron2 tracing export of a Faster R-CNN model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorModelConfig {
    #[serde(default = "default_input_name")]
    pub input_name: String,

    #[serde(default = "default_boxes_output")]
    pub boxes_output: String,

    #[serde(default = "default_scores_output")]
    pub scores_output: String,

    #[serde(default = "default_classes_output")]
    pub classes_output: String,

    /// Target length of the short image side
    #[serde(default = "default_min_size_test")]
    pub min_size_test: u32,

    /// Upper bound for the long image side
    #[serde(default = "default_max_size_test")]
    pub max_size_test: u32,

    #[serde(default = "default_input_format")]
    pub input_format: InputFormat,
}

impl Default for DetectorModelConfig {
    fn default() -> Self {
        Self {
            input_name: default_input_name(),
            boxes_output: default_boxes_output(),
            scores_output: default_scores_output(),
            classes_output: default_classes_output(),
            min_size_test: default_min_size_test(),
            max_size_test: default_max_size_test(),
            input_format: default_input_format(),
        }
    }
}

impl DetectorModelConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read detector config {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse detector config {}", path.display()))?;

        anyhow::ensure!(
            config.min_size_test > 0 && config.max_size_test >= config.min_size_test,
            "Detector config needs 0 < min_size_test <= max_size_test (got {} / {})",
            config.min_size_test,
            config.max_size_test
        );

        Ok(config)
    }

    /// Read `path` if given, otherwise use the defaults
    pub fn from_optional_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
