//! Detection sources: where a detection for a captured frame comes from

pub mod local;
pub mod openai;

pub use local::LocalModelSource;
pub use openai::OpenAiVisionSource;

use crate::camera::Frame;
use crate::config::{Backend, SizeupConfig};
use crate::error::EyeError;
use async_trait::async_trait;
use sizeup_core::{Detection, RemoteReport};
use std::sync::Arc;

/// Raw answer of a detection source, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutput {
    /// Pixel bounding boxes, most confident first
    Local(Vec<Detection>),
    /// Physical dimensions reported by a vision API
    Remote(RemoteReport),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetectionSource: Send + Sync {
    /// Short name for logs and output
    fn name(&self) -> &'static str;

    /// Bring the source up (model availability, credentials)
    async fn load(&self) -> Result<(), EyeError>;

    /// Detect objects in one frame
    async fn detect(&self, frame: &Frame) -> Result<DetectionOutput, EyeError>;
}

/// Build the source the configuration selects
pub fn build_source(config: &SizeupConfig) -> Result<Arc<dyn DetectionSource>, EyeError> {
    match config.detector.backend {
        Backend::Local => Ok(Arc::new(LocalModelSource::new(config.local.clone()))),
        Backend::OpenAi => Ok(Arc::new(OpenAiVisionSource::new(config.openai.clone())?)),
    }
}
