//! Capture-then-analyze session

use crate::camera::{Frame, FrameSource};
use crate::config::SizeupConfig;
use crate::error::EyeError;
use crate::sources::{DetectionOutput, DetectionSource};
use sizeup_core::{normalize_local, normalize_remote, Analysis, CalibrationInput, TargetSelector};
use std::sync::Arc;
use tracing::{debug, info};

/// One capture/analysis cycle at a time over a frame source and a
/// detection source. A new capture discards the previous result.
pub struct CaptureSession {
    config: Arc<SizeupConfig>,
    camera: Arc<dyn FrameSource>,
    source: Arc<dyn DetectionSource>,
    selector: TargetSelector,
    frame: Option<Frame>,
    result: Option<Analysis>,
    ready: bool,
}

impl CaptureSession {
    pub fn new(
        config: Arc<SizeupConfig>,
        camera: Arc<dyn FrameSource>,
        source: Arc<dyn DetectionSource>,
    ) -> Self {
        let selector = TargetSelector::new(
            config.detector.target_classes.clone(),
            config.detector.min_confidence,
        );

        Self {
            config,
            camera,
            source,
            selector,
            frame: None,
            result: None,
            ready: false,
        }
    }

    /// Open the camera and load the detector concurrently
    pub async fn setup(&mut self) -> Result<(), EyeError> {
        info!("Setting up session with {} detector", self.source.name());

        let (camera, detector) = tokio::join!(self.camera.open(), self.source.load());
        camera?;
        detector?;

        self.ready = true;
        info!("Session ready");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Grab a frame, replacing the previous one and its result
    pub fn capture(&mut self) -> Result<&Frame, EyeError> {
        let frame = self.camera.capture()?;
        debug!("Captured {}x{} frame", frame.width, frame.height);

        self.result = None;
        Ok(self.frame.insert(frame))
    }

    /// Analyze the captured frame
    pub async fn analyze(&mut self, calibration: &CalibrationInput) -> Result<&Analysis, EyeError> {
        let frame = self.frame.as_ref().ok_or(EyeError::NoFrame)?;
        let focal = self.config.estimator.focal_length_for(frame.height);

        let output = self.source.detect(frame).await?;
        let analysis = match output {
            DetectionOutput::Local(detections) => {
                normalize_local(&detections, &self.selector, calibration, focal)?
            }
            DetectionOutput::Remote(report) => normalize_remote(
                &report,
                calibration,
                frame.height as f64,
                focal,
                self.config.estimator.remote_screen_fraction,
            )?,
        };

        info!(
            "Analyzed '{}' via {}: {:?}",
            analysis.label,
            self.source.name(),
            analysis.estimation
        );
        Ok(self.result.insert(analysis))
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn current_result(&self) -> Option<&Analysis> {
        self.result.as_ref()
    }
}
