//! Error types for sizeup-eye

use sizeup_core::NormalizeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EyeError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Detection source unavailable: {0}")]
    DetectionSourceUnavailable(String),

    #[error("No detection found")]
    NoDetectionFound,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Malformed remote response: {0}")]
    MalformedRemoteResponse(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("No frame captured")]
    NoFrame,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<NormalizeError> for EyeError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::NoDetectionFound => EyeError::NoDetectionFound,
            NormalizeError::InvalidGeometry(msg) => EyeError::InvalidGeometry(msg),
            NormalizeError::MalformedRemoteResponse(msg) => EyeError::MalformedRemoteResponse(msg),
        }
    }
}

impl EyeError {
    /// Message shown to the user; a retry means recapturing or rerunning
    pub fn user_message(&self) -> String {
        match self {
            EyeError::CameraUnavailable(_) => "Failed to access camera".to_string(),
            EyeError::NoDetectionFound => "No object detected in the image".to_string(),
            EyeError::AuthenticationFailed => {
                "The vision API rejected the API key".to_string()
            }
            EyeError::RateLimit => "The vision API is rate limiting requests, try again later".to_string(),
            EyeError::NoFrame => "Capture an image before analyzing".to_string(),
            other => format!("An error occurred during image analysis: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EyeError>;
