// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection model manager: loads the detector and class list once

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{DetectorModelConfig, Device, ServiceConfig};
use crate::vision::classes::load_class_names;
use crate::vision::detector::{ObjectDetector, OnnxDetector};

/// Paths and settings needed to load the detector
#[derive(Debug, Clone)]
pub struct DetectionModelConfig {
    pub weights_path: PathBuf,
    pub model_config_path: Option<PathBuf>,
    pub classes_path: PathBuf,
    pub expected_classes: usize,
    pub threshold: f32,
    pub device: Device,
}

impl From<&ServiceConfig> for DetectionModelConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            weights_path: config.detect_weight.clone(),
            model_config_path: config.detect_config.clone(),
            classes_path: config.classes.clone(),
            expected_classes: config.number_class,
            threshold: config.threshold,
            device: config.device,
        }
    }
}

/// Information about the loaded model, reported by `/health`
#[derive(Debug, Clone, Serialize)]
pub struct DetectionModelInfo {
    pub name: String,
    pub weights: String,
    pub device: String,
    pub threshold: f32,
    pub classes: Vec<String>,
}

/// Read-only handle to the detector shared by all requests
pub struct DetectionModelManager {
    detector: Arc<dyn ObjectDetector>,
    class_names: Vec<String>,
    info: DetectionModelInfo,
}

impl DetectionModelManager {
    /// Load class names and the ONNX detector
    pub fn load(config: DetectionModelConfig) -> Result<Self> {
        let class_names = load_class_names(&config.classes_path)?;

        if class_names.len() != config.expected_classes {
            tracing::warn!(
                "⚠️ Class list {} has {} names but number_class is {}",
                config.classes_path.display(),
                class_names.len(),
                config.expected_classes
            );
        }

        let model_config =
            DetectorModelConfig::from_optional_file(config.model_config_path.as_deref())
                .context("Failed to load detector model config")?;

        let detector = OnnxDetector::new(
            &config.weights_path,
            model_config,
            config.device,
            config.threshold,
            class_names.clone(),
        )?;

        let info = DetectionModelInfo {
            name: detector.name().to_string(),
            weights: config.weights_path.display().to_string(),
            device: config.device.to_string(),
            threshold: detector.confidence_threshold(),
            classes: class_names.clone(),
        };

        Ok(Self {
            detector: Arc::new(detector),
            class_names,
            info,
        })
    }

    /// Wrap an existing detector (used by tests and alternative backends)
    pub fn from_detector(
        detector: Arc<dyn ObjectDetector>,
        class_names: Vec<String>,
        threshold: f32,
    ) -> Self {
        let info = DetectionModelInfo {
            name: detector.name().to_string(),
            weights: String::new(),
            device: Device::Cpu.to_string(),
            threshold,
            classes: class_names.clone(),
        };

        Self {
            detector,
            class_names,
            info,
        }
    }

    pub fn detector(&self) -> Arc<dyn ObjectDetector> {
        self.detector.clone()
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn model_info(&self) -> &DetectionModelInfo {
        &self.info
    }
}
