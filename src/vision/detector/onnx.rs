// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime detector
//!
//! Runs a detectron2 tracing export: one CHW image input, three outputs
//! (boxes, scores, classes) in resized-input pixel coordinates.

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use ndarray::ArrayViewD;
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::prepare_image;
use super::{BoundingBox, Detection, ObjectDetector};
use crate::config::{DetectorModelConfig, Device};

/// Raw model outputs before thresholding, in resized-input coordinates
#[derive(Debug, Clone, Default)]
pub struct RawDetections {
    /// `x1, y1, x2, y2` per detection
    pub boxes: Vec<[f32; 4]>,
    pub scores: Vec<f32>,
    pub classes: Vec<i64>,
}

/// Threshold, rescale, clip and label raw detections
///
/// Keeps model order. A class index outside `class_names` is labelled
/// `class_<index>`.
pub fn postprocess(
    raw: &RawDetections,
    scale_x: f32,
    scale_y: f32,
    image_width: u32,
    image_height: u32,
    threshold: f32,
    class_names: &[String],
) -> Vec<Detection> {
    let max_x = image_width as f32;
    let max_y = image_height as f32;

    raw.boxes
        .iter()
        .zip(raw.scores.iter())
        .zip(raw.classes.iter())
        .filter(|((_, score), _)| score.is_finite() && **score > threshold)
        .map(|((b, score), class)| {
            let clip = |v: f32, max: f32| (v.clamp(0.0, max)).floor() as i32;
            let bbox = BoundingBox {
                x1: clip(b[0] * scale_x, max_x),
                y1: clip(b[1] * scale_y, max_y),
                x2: clip(b[2] * scale_x, max_x),
                y2: clip(b[3] * scale_y, max_y),
            };

            let label = usize::try_from(*class)
                .ok()
                .and_then(|idx| class_names.get(idx))
                .cloned()
                .unwrap_or_else(|| format!("class_{}", class));

            Detection {
                bbox,
                score: *score,
                label,
            }
        })
        .collect()
}

/// Detection model backed by an ONNX Runtime session
///
/// Weights are loaded once; the session is shared behind a mutex because
/// `Session::run` needs exclusive access.
#[derive(Clone)]
pub struct OnnxDetector {
    session: Arc<Mutex<Session>>,
    config: DetectorModelConfig,
    class_names: Arc<Vec<String>>,
    confidence_threshold: f32,
    device: Device,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("config", &self.config)
            .field("classes", &self.class_names.len())
            .field("confidence_threshold", &self.confidence_threshold)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

fn execution_provider(device: Device) -> ExecutionProviderDispatch {
    match device {
        Device::Cpu => CPUExecutionProvider::default().build(),
        Device::Cuda(id) => CUDAExecutionProvider::default()
            .with_device_id(id)
            .build(),
    }
}

impl OnnxDetector {
    /// Load the detection model
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - The graph lacks the configured input or outputs
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        config: DetectorModelConfig,
        device: Device,
        confidence_threshold: f32,
        class_names: Vec<String>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        info!(
            "Loading detection model from {} on {}",
            model_path.display(),
            device
        );

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([execution_provider(device)])
            .context("Failed to set execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!(
                    "Failed to load detection model from {}",
                    model_path.display()
                )
            })?;

        anyhow::ensure!(
            session.inputs.iter().any(|i| i.name == config.input_name),
            "Detection model has no input named '{}'",
            config.input_name
        );
        for name in [
            &config.boxes_output,
            &config.scores_output,
            &config.classes_output,
        ] {
            anyhow::ensure!(
                session.outputs.iter().any(|o| &o.name == name),
                "Detection model has no output named '{}'",
                name
            );
        }

        debug!(
            "Detection model inputs: {:?}, outputs: {:?}",
            session.inputs.iter().map(|i| &i.name).collect::<Vec<_>>(),
            session.outputs.iter().map(|o| &o.name).collect::<Vec<_>>()
        );

        info!("✅ Detection model loaded ({} classes)", class_names.len());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            config,
            class_names: Arc::new(class_names),
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
            device,
        })
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    fn run(&self, image: &DynamicImage) -> Result<(RawDetections, f32, f32)> {
        let prepared = prepare_image(
            image,
            self.config.min_size_test,
            self.config.max_size_test,
            self.config.input_format,
        );

        let input_value =
            Value::from_array(prepared.tensor).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![self.config.input_name.as_str() => input_value])
            .context("Detection inference failed")?;

        let boxes = outputs[self.config.boxes_output.as_str()]
            .try_extract_array::<f32>()
            .context("Failed to extract boxes tensor")?;
        let scores = outputs[self.config.scores_output.as_str()]
            .try_extract_array::<f32>()
            .context("Failed to extract scores tensor")?;

        let classes_value = &outputs[self.config.classes_output.as_str()];
        let classes: Vec<i64> = match classes_value.try_extract_array::<i64>() {
            Ok(view) => view.iter().copied().collect(),
            Err(_) => classes_value
                .try_extract_array::<f32>()
                .context("Failed to extract classes tensor")?
                .iter()
                .map(|c| *c as i64)
                .collect(),
        };

        let raw = collect_raw(boxes, scores, classes)?;
        Ok((raw, prepared.scale_x, prepared.scale_y))
    }
}

fn collect_raw(
    boxes: ArrayViewD<f32>,
    scores: ArrayViewD<f32>,
    classes: Vec<i64>,
) -> Result<RawDetections> {
    let scores: Vec<f32> = scores.iter().copied().collect();
    let flat: Vec<f32> = boxes.iter().copied().collect();

    anyhow::ensure!(
        flat.len() == scores.len() * 4 && classes.len() == scores.len(),
        "Mismatched detection outputs: {} box values, {} scores, {} classes",
        flat.len(),
        scores.len(),
        classes.len()
    );

    let boxes = flat
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();

    Ok(RawDetections {
        boxes,
        scores,
        classes,
    })
}

impl ObjectDetector for OnnxDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let (width, height) = image.dimensions();
        let (raw, scale_x, scale_y) = self.run(image)?;

        let detections = postprocess(
            &raw,
            scale_x,
            scale_y,
            width,
            height,
            self.confidence_threshold,
            &self.class_names,
        );

        debug!(
            "Model returned {} boxes, {} above threshold {:.2}",
            raw.scores.len(),
            detections.len(),
            self.confidence_threshold
        );

        Ok(detections)
    }

    fn name(&self) -> &str {
        "onnx-detectron2"
    }
}
