// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration loaded once at startup

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default upload limit (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Compute device for ONNX Runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    Cpu,
    Cuda(i32),
}

impl FromStr for Device {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda(0)),
            other => match other.strip_prefix("cuda:") {
                Some(id) => id
                    .parse::<i32>()
                    .ok()
                    .filter(|id| *id >= 0)
                    .map(Device::Cuda)
                    .ok_or_else(|| invalid("device", format!("bad CUDA device id '{}'", id))),
                None => Err(invalid(
                    "device",
                    format!("unsupported device '{}', expected cpu, cuda or cuda:N", s),
                )),
            },
        }
    }
}

impl TryFrom<String> for Device {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(id) => write!(f, "cuda:{}", id),
        }
    }
}

fn default_service_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_path() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_threshold() -> f32 {
    0.5
}

fn default_number_class() -> usize {
    4
}

fn default_device() -> Device {
    Device::Cpu
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_max_pending_inferences() -> usize {
    4
}

/// `[service]` table of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_ip")]
    pub service_ip: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory for per-run log files
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// ONNX weights of the detection model
    pub detect_weight: PathBuf,

    /// Detector model TOML (tensor names, resize limits)
    #[serde(default)]
    pub detect_config: Option<PathBuf>,

    /// Detections must score strictly above this
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Class count the model was trained with
    #[serde(default = "default_number_class")]
    pub number_class: usize,

    #[serde(default = "default_device")]
    pub device: Device,

    /// Class-name list, one per line
    pub classes: PathBuf,

    /// Where to write the debug overlay; disabled when unset
    #[serde(default)]
    pub debug_image: Option<PathBuf>,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Predictions admitted at once before answering 503
    #[serde(default = "default_max_pending_inferences")]
    pub max_pending_inferences: usize,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    service: ServiceConfig,
}

impl ServiceConfig {
    /// Config with defaults for everything except the model files
    pub fn new(detect_weight: impl Into<PathBuf>, classes: impl Into<PathBuf>) -> Self {
        Self {
            service_ip: default_service_ip(),
            port: default_port(),
            log_path: default_log_path(),
            detect_weight: detect_weight.into(),
            detect_config: None,
            threshold: default_threshold(),
            number_class: default_number_class(),
            device: default_device(),
            classes: classes.into(),
            debug_image: None,
            max_upload_bytes: default_max_upload_bytes(),
            max_pending_inferences: default_max_pending_inferences(),
        }
    }

    /// Parse the `[service]` table from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.service)
    }

    /// Load from file, then apply environment overrides and validate
    ///
    /// Relative model paths are resolved against the working directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QUADRANT_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("QUADRANT_HOST") {
            self.service_ip = host;
        }

        if let Some(port) = lookup("QUADRANT_PORT") {
            self.port = port
                .parse()
                .map_err(|_| invalid("QUADRANT_PORT", format!("'{}' is not a port", port)))?;
        }

        if let Some(log_path) = lookup("QUADRANT_LOG_PATH") {
            self.log_path = PathBuf::from(log_path);
        }

        if let Some(threshold) = lookup("QUADRANT_THRESHOLD") {
            self.threshold = threshold.parse().map_err(|_| {
                invalid(
                    "QUADRANT_THRESHOLD",
                    format!("'{}' is not a number", threshold),
                )
            })?;
        }

        if let Some(device) = lookup("QUADRANT_DEVICE") {
            self.device = device.parse()?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(invalid(
                "threshold",
                format!("{} is outside [0, 1]", self.threshold),
            ));
        }

        if self.port == 0 {
            return Err(invalid("port", "port must be non-zero"));
        }

        if self.number_class == 0 {
            return Err(invalid("number_class", "at least one class is required"));
        }

        if self.max_pending_inferences == 0 {
            return Err(invalid(
                "max_pending_inferences",
                "at least one pending inference is required",
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(invalid("max_upload_bytes", "upload limit must be non-zero"));
        }

        Ok(())
    }

    /// `host:port` for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.service_ip, self.port)
    }
}
