//! Detection and estimation records shared by every stage

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pixel-space rectangle delimiting a detected object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build from the `[x, y, width, height]` layout local detectors emit
    pub fn from_xywh(xywh: [f64; 4]) -> Self {
        Self::new(xywh[0], xywh[1], xywh[2], xywh[3])
    }

    /// Finite coordinates and a strictly positive extent
    pub fn is_usable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// One labelled detection from a local model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Score in `0..=1`
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// Shape assumed when turning a bounding box into a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Box,
    Cylinder,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Box => "box",
            Shape::Cylinder => "cylinder",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "box" => Ok(Shape::Box),
            "cylinder" => Ok(Shape::Cylinder),
            other => Err(format!("unknown shape '{}' (expected box or cylinder)", other)),
        }
    }
}

/// User calibration read at analysis time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationInput {
    pub real_height_meters: Option<f64>,
    pub shape: Shape,
}

impl CalibrationInput {
    pub fn new(real_height_meters: Option<f64>, shape: Shape) -> Self {
        Self {
            real_height_meters,
            shape,
        }
    }

    /// The user enters heights in centimeters
    pub fn from_centimeters(real_height_cm: Option<f64>, shape: Shape) -> Self {
        Self::new(real_height_cm.map(|cm| cm / 100.0), shape)
    }

    /// The override height, if it is one we can actually scale by
    pub fn override_height(&self) -> Option<f64> {
        self.real_height_meters
            .filter(|h| h.is_finite() && *h > 0.0)
    }
}

/// Distance and volume derived from one detection.
/// `None` means the inputs could not support an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EstimationResult {
    pub distance_meters: Option<f64>,
    pub volume_cubic_meters: Option<f64>,
}

impl EstimationResult {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.distance_meters.is_some() && self.volume_cubic_meters.is_some()
    }
}

/// Where a detection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Remote,
}

/// Everything the presenter needs for one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub label: String,
    pub confidence: f64,
    pub reference_height_meters: f64,
    pub shape: Shape,
    pub estimation: EstimationResult,
    pub source: SourceKind,
}
