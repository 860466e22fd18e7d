//! Still-frame capture

use crate::error::EyeError;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, ImageOutputFormat};
use parking_lot::RwLock;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const JPEG_QUALITY: u8 = 90;

/// One still frame, JPEG encoded
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
    /// File the frame was read from, when there is one
    pub path: Option<PathBuf>,
}

impl Frame {
    /// Decode any supported image and keep it as JPEG
    pub fn from_image_bytes(bytes: Vec<u8>, path: Option<PathBuf>) -> Result<Self, EyeError> {
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        let (width, height) = (decoded.width(), decoded.height());

        let jpeg = if format == ImageFormat::Jpeg {
            bytes
        } else {
            debug!("Re-encoding {:?} frame as JPEG", format);
            encode_jpeg(&decoded)?
        };

        Ok(Self {
            width,
            height,
            jpeg,
            path,
        })
    }
}

fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, EyeError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
    Ok(buffer.into_inner())
}

/// Something that can produce a still frame on demand
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Acquire the source; called once at session setup
    async fn open(&self) -> Result<(), EyeError>;

    /// Grab the current frame
    fn capture(&self) -> Result<Frame, EyeError>;
}

/// Camera backed by a photo already taken by the device
pub struct StillImageCamera {
    path: PathBuf,
    frame: RwLock<Option<Frame>>,
}

impl StillImageCamera {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame: RwLock::new(None),
        }
    }
}

#[async_trait]
impl FrameSource for StillImageCamera {
    async fn open(&self) -> Result<(), EyeError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            EyeError::CameraUnavailable(format!("Failed to open {:?}: {}", self.path, e))
        })?;

        let frame = Frame::from_image_bytes(bytes, Some(self.path.clone())).map_err(|e| {
            EyeError::CameraUnavailable(format!("Failed to decode {:?}: {}", self.path, e))
        })?;

        info!("Camera ready: {:?} at {}x{}", self.path, frame.width, frame.height);
        *self.frame.write() = Some(frame);
        Ok(())
    }

    fn capture(&self) -> Result<Frame, EyeError> {
        self.frame
            .read()
            .clone()
            .ok_or_else(|| EyeError::CameraUnavailable("Camera not initialized".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([120, 80, 40]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_frame_from_png_is_reencoded() {
        let frame = Frame::from_image_bytes(png_bytes(32, 24), None).unwrap();
        assert_eq!((frame.width, frame.height), (32, 24));
        assert_eq!(image::guess_format(&frame.jpeg).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_frame_rejects_garbage() {
        assert!(Frame::from_image_bytes(b"not an image".to_vec(), None).is_err());
    }

    #[test]
    fn test_capture_before_open() {
        let camera = StillImageCamera::new("/nonexistent/photo.jpg");
        assert!(matches!(camera.capture(), Err(EyeError::CameraUnavailable(_))));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let camera = StillImageCamera::new("/nonexistent/photo.jpg");
        assert!(matches!(camera.open().await, Err(EyeError::CameraUnavailable(_))));
    }

    #[tokio::test]
    async fn test_open_and_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes(16, 48)).unwrap();

        let camera = StillImageCamera::new(&path);
        camera.open().await.unwrap();
        let frame = camera.capture().unwrap();
        assert_eq!(frame.height, 48);
        assert_eq!(frame.path.as_deref(), Some(path.as_path()));
    }
}
