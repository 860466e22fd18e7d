//! Local object-detection model run as a subprocess
//!
//! The model is any program that takes an image path as its last argument
//! and prints COCO-SSD style detections on stdout:
//! `[{"class": "cup", "score": 0.87, "bbox": [x, y, width, height]}, ...]`

use crate::camera::Frame;
use crate::config::LocalModelConfig;
use crate::error::EyeError;
use crate::sources::{DetectionOutput, DetectionSource};
use async_trait::async_trait;
use serde::Deserialize;
use sizeup_core::{BoundingBox, Detection};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// One prediction as printed by the model
#[derive(Debug, Deserialize)]
struct RawPrediction {
    #[serde(alias = "label")]
    class: String,
    #[serde(alias = "confidence")]
    score: f64,
    bbox: [f64; 4],
}

/// Parse model stdout into detections, most confident first
pub fn parse_predictions(stdout: &str) -> Result<Vec<Detection>, EyeError> {
    let raw: Vec<RawPrediction> = serde_json::from_str(stdout.trim()).map_err(|e| {
        EyeError::DetectionSourceUnavailable(format!("Model printed invalid detections: {}", e))
    })?;

    let mut detections: Vec<Detection> = raw
        .into_iter()
        .map(|p| Detection::new(p.class, p.score, BoundingBox::from_xywh(p.bbox)))
        .collect();

    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(detections)
}

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Find `command` the way a shell would
fn resolve_program(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(command))
        .find(|path| path.is_file())
}

/// Detection source backed by a local model
pub struct LocalModelSource {
    config: LocalModelConfig,
}

impl LocalModelSource {
    pub fn new(config: LocalModelConfig) -> Self {
        Self { config }
    }

    async fn run_model(&self, image_path: &Path) -> Result<String, EyeError> {
        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .arg(image_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| {
                EyeError::DetectionSourceUnavailable(format!(
                    "Model did not answer within {}s",
                    self.config.timeout_secs
                ))
            })?
            .map_err(|e| {
                EyeError::DetectionSourceUnavailable(format!(
                    "Failed to run '{}': {}",
                    self.config.command, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.chars().take(500).collect();
            return Err(EyeError::DetectionSourceUnavailable(format!(
                "Model exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DetectionSource for LocalModelSource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load(&self) -> Result<(), EyeError> {
        match resolve_program(&self.config.command) {
            Some(path) => {
                info!("Local model ready: {:?}", path);
                Ok(())
            }
            None => Err(EyeError::DetectionSourceUnavailable(format!(
                "Model command '{}' not found",
                self.config.command
            ))),
        }
    }

    async fn detect(&self, frame: &Frame) -> Result<DetectionOutput, EyeError> {
        // The model reads from disk; frames without a backing file get a scratch copy
        let (image_path, scratch) = match &frame.path {
            Some(path) => (path.clone(), false),
            None => {
                let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
                let path = std::env::temp_dir()
                    .join(format!("sizeup-frame-{}-{}.jpg", std::process::id(), n));
                tokio::fs::write(&path, &frame.jpeg).await?;
                (path, true)
            }
        };

        debug!("Running local model on {:?}", image_path);
        let result = self.run_model(&image_path).await;

        if scratch {
            if let Err(e) = tokio::fs::remove_file(&image_path).await {
                warn!("Failed to remove scratch frame {:?}: {}", image_path, e);
            }
        }

        let detections = parse_predictions(&result?)?;
        debug!("Local model detected {} objects", detections.len());
        Ok(DetectionOutput::Local(detections))
    }
}
