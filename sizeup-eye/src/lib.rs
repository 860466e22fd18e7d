//! sizeup-eye: capture and detection for sizeup
//!
//! Grabs a still frame, asks a detection source about it (a local
//! object-detection model or a remote vision API) and hands the answer
//! to the estimator in sizeup-core.

pub mod camera;
pub mod config;
pub mod error;
pub mod session;
pub mod sources;

pub use camera::{Frame, FrameSource, StillImageCamera};
pub use config::{Backend, SizeupConfig};
pub use error::EyeError;
pub use session::CaptureSession;
pub use sources::{build_source, DetectionOutput, DetectionSource};
