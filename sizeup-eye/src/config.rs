//! Configuration for sizeup-eye

use crate::error::EyeError;
use serde::{Deserialize, Serialize};
use sizeup_core::Shape;
use std::path::Path;
use std::str::FromStr;

/// Which detection source answers an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local object-detection model
    #[default]
    Local,
    /// Remote OpenAI vision model
    OpenAi,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::OpenAi => "openai",
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "openai" => Ok(Backend::OpenAi),
            other => Err(format!("unknown backend '{}' (expected local or openai)", other)),
        }
    }
}

/// Geometry estimator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Pinhole focal length in pixels. Without one the frame height is
    /// used, which is roughly right for phone cameras.
    pub focal_length_px: Option<f64>,
    /// Shape assumed when the user does not pick one
    pub default_shape: Shape,
    /// Share of the frame height a remotely analyzed object is assumed to fill
    pub remote_screen_fraction: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            focal_length_px: None,
            default_shape: Shape::Box,
            remote_screen_fraction: 0.5,
        }
    }
}

impl EstimatorConfig {
    pub fn focal_length_for(&self, frame_height_px: u32) -> f64 {
        self.focal_length_px.unwrap_or(frame_height_px as f64)
    }
}

/// Detection source selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub backend: Backend,
    /// Labels worth estimating; empty means the most confident detection
    pub target_classes: Vec<String>,
    pub min_confidence: f64,
}

/// Local model invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    /// Inference program; receives the image path as its last argument and
    /// prints COCO-SSD style JSON detections
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            command: "detect-objects".to_string(),
            args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

/// Remote vision API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: String,
    /// Falls back to `OPENAI_API_KEY`
    pub api_key: Option<String>,
    pub max_image_bytes: usize,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            max_image_bytes: 20 * 1024 * 1024,
            timeout_secs: 60,
            max_tokens: 300,
        }
    }
}

impl OpenAiConfig {
    pub const API_KEY_ENV: &'static str = "OPENAI_API_KEY";

    /// Configured key, else the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(Self::API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeupConfig {
    pub estimator: EstimatorConfig,
    pub detector: DetectorConfig,
    pub local: LocalModelConfig,
    pub openai: OpenAiConfig,
}

impl SizeupConfig {
    /// Load a TOML file; missing sections take their defaults
    pub fn from_file(path: &Path) -> Result<Self, EyeError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EyeError::Config(format!("Failed to read {:?}: {}", path, e)))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, EyeError> {
        let config: SizeupConfig = toml::from_str(text)
            .map_err(|e| EyeError::Config(format!("Invalid configuration: {}", e)))?;
        config.validate().map_err(EyeError::Config)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(focal) = self.estimator.focal_length_px {
            if !focal.is_finite() || focal <= 0.0 {
                return Err("Focal length must be a positive number of pixels".to_string());
            }
        }

        let fraction = self.estimator.remote_screen_fraction;
        if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
            return Err("Remote screen fraction must be in (0, 1]".to_string());
        }

        let min_confidence = self.detector.min_confidence;
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err("Minimum confidence must be between 0 and 1".to_string());
        }

        if self.local.command.trim().is_empty() {
            return Err("Local model command must not be empty".to_string());
        }

        if self.local.timeout_secs == 0 || self.openai.timeout_secs == 0 {
            return Err("Timeouts must be at least one second".to_string());
        }

        if self.openai.model.trim().is_empty() {
            return Err("OpenAI model must not be empty".to_string());
        }

        if !self.openai.base_url.starts_with("https://") {
            return Err("OpenAI base URL must use https".to_string());
        }

        if self.openai.max_image_bytes == 0 {
            return Err("Maximum image size must be non-zero".to_string());
        }

        Ok(())
    }
}
