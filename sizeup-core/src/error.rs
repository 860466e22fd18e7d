//! Error types for sizeup-core

use thiserror::Error;

/// Failures while turning a detection source's output into an analysis.
///
/// A bad bounding box never shows up here; it comes back as `None`
/// fields. These variants cover the cases where there is nothing to
/// estimate at all, including a frame without a usable pixel scale.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("No detection found")]
    NoDetectionFound,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Malformed remote response: {0}")]
    MalformedRemoteResponse(String),
}
