//! Normalization of local detections and remote vision reports
//!
//! Local models hand back pixel bounding boxes that still need the
//! geometry estimator. Remote vision APIs answer with physical dimensions
//! directly, so that path only coerces and unit-converts the numbers.
//! Both end up as an [`Analysis`].

use crate::error::NormalizeError;
use crate::geometry::{distance_from_height, estimate, resolve_reference_height};
use crate::priors::ObjectSizePrior;
use crate::types::{Analysis, CalibrationInput, Detection, EstimationResult, Shape, SourceKind};
use serde::Serialize;
use serde_json::Value;
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Picks the detection to estimate from a local model's output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSelector {
    /// When non-empty, only these labels are considered
    pub target_classes: Vec<String>,
    pub min_confidence: f64,
}

impl TargetSelector {
    pub fn new(target_classes: Vec<String>, min_confidence: f64) -> Self {
        Self {
            target_classes,
            min_confidence,
        }
    }

    fn is_target(&self, label: &str) -> bool {
        let label = label.trim();
        self.target_classes
            .iter()
            .any(|target| target.trim().eq_ignore_ascii_case(label))
    }

    /// First target-class match in detector order, or the most confident
    /// detection when no target classes are configured.
    pub fn select<'a>(&self, detections: &'a [Detection]) -> Option<&'a Detection> {
        let mut candidates = detections
            .iter()
            .filter(|d| d.confidence.is_finite() && d.confidence >= self.min_confidence);

        if self.target_classes.is_empty() {
            candidates.max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        } else {
            candidates.find(|d| self.is_target(&d.label))
        }
    }
}

/// Object report from a remote vision API, in the units the prompt asks for
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RemoteReport {
    pub object: String,
    pub confidence: Option<f64>,
    pub volume_liters: Option<f64>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub depth_cm: Option<f64>,
}

/// Split `"25 cm"` / `"25cm"` / `"0.4"` / `"1.2e-3 m3"` into a number and a
/// lowercase unit
fn parse_quantity(text: &str) -> Option<(f64, String)> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut split = bytes
        .iter()
        .position(|&b| !(b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+')))
        .unwrap_or(bytes.len());

    // An exponent only counts when digits follow it
    if matches!(bytes.get(split), Some(b'e' | b'E')) {
        let mut exponent = split + 1;
        if matches!(bytes.get(exponent), Some(b'-' | b'+')) {
            exponent += 1;
        }
        let digits = bytes[exponent..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits > 0 {
            split = exponent + digits;
        }
    }

    let value: f64 = text[..split].parse().ok()?;
    let unit = text[split..].trim().to_lowercase();
    Some((value, unit))
}

fn length_to_cm(value: &Value) -> Option<f64> {
    let cm = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let (number, unit) = parse_quantity(s)?;
            match unit.as_str() {
                "" | "cm" | "centimeters" | "centimeter" => number,
                "mm" | "millimeters" | "millimeter" => number / 10.0,
                "m" | "meters" | "meter" => number * 100.0,
                _ => return None,
            }
        }
        _ => return None,
    };
    cm.is_finite().then_some(cm)
}

fn volume_to_liters(value: &Value) -> Option<f64> {
    let liters = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let (number, unit) = parse_quantity(s)?;
            match unit.as_str() {
                "" | "l" | "liter" | "liters" | "litre" | "litres" => number,
                "ml" | "milliliters" | "millilitres" => number / 1000.0,
                "m3" | "m³" | "cubic meters" => number * 1000.0,
                "cm3" | "cm³" | "cc" => number / 1000.0,
                _ => return None,
            }
        }
        _ => return None,
    };
    liters.is_finite().then_some(liters)
}

fn plain_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let (number, unit) = parse_quantity(s)?;
            if unit == "%" {
                number / 100.0
            } else if unit.is_empty() {
                number
            } else {
                return None;
            }
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Pull the JSON object out of a model reply. Replies are often wrapped in
/// a Markdown code fence or surrounded by a sentence of prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the text of a remote vision reply into a [`RemoteReport`]
pub fn parse_remote_report(text: &str) -> Result<RemoteReport, NormalizeError> {
    let json = extract_json_object(text).ok_or_else(|| {
        NormalizeError::MalformedRemoteResponse("reply does not contain a JSON object".to_string())
    })?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| NormalizeError::MalformedRemoteResponse(format!("invalid JSON: {}", e)))?;

    RemoteReport::from_value(&value)
}

impl RemoteReport {
    /// Coerce a loosely typed `{object, confidence, volume, dimensions}` value
    pub fn from_value(value: &Value) -> Result<Self, NormalizeError> {
        let obj = value.as_object().ok_or_else(|| {
            NormalizeError::MalformedRemoteResponse("expected a JSON object".to_string())
        })?;

        let object = obj
            .get("object")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                NormalizeError::MalformedRemoteResponse("missing 'object' label".to_string())
            })?
            .to_string();

        let dimensions = obj.get("dimensions").and_then(Value::as_object);
        let dimension = |key: &str| {
            dimensions
                .and_then(|d| d.get(key))
                .and_then(length_to_cm)
        };

        let report = Self {
            object,
            confidence: obj.get("confidence").and_then(plain_number),
            volume_liters: obj.get("volume").and_then(volume_to_liters),
            width_cm: dimension("width"),
            height_cm: dimension("height"),
            depth_cm: dimension("depth"),
        };

        debug!("Parsed remote report: {:?}", report);
        Ok(report)
    }

    /// Confidence in `0..=1`; values above 1 are read as percentages
    pub fn normalized_confidence(&self) -> f64 {
        match self.confidence {
            Some(c) if c > 1.0 => (c / 100.0).clamp(0.0, 1.0),
            Some(c) => c.clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

fn cm_to_m(cm: Option<f64>) -> Option<f64> {
    cm.filter(|v| v.is_finite() && *v > 0.0).map(|v| v / 100.0)
}

fn volume_from_dimensions(width_m: f64, height_m: f64, depth_m: f64, shape: Shape) -> f64 {
    match shape {
        Shape::Cylinder => PI * (width_m / 2.0).powi(2) * height_m,
        Shape::Box => width_m * height_m * depth_m,
    }
}

/// The frame itself must have a usable scale; a bad box only blanks fields
fn check_frame_scale(name: &str, value: f64) -> Result<(), NormalizeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(NormalizeError::InvalidGeometry(format!(
            "{} must be a positive number of pixels, got {}",
            name, value
        )))
    }
}

/// Local-model path: select a detection and run the geometry estimator
pub fn normalize_local(
    detections: &[Detection],
    selector: &TargetSelector,
    calibration: &CalibrationInput,
    focal_length_px: f64,
) -> Result<Analysis, NormalizeError> {
    check_frame_scale("focal length", focal_length_px)?;

    let detection = selector
        .select(detections)
        .ok_or(NormalizeError::NoDetectionFound)?;

    debug!(
        "Selected '{}' ({:.2}) out of {} detections",
        detection.label,
        detection.confidence,
        detections.len()
    );

    if !detection.bbox.is_usable() {
        warn!(
            "Detection '{}' has unusable bounding box {:?}",
            detection.label, detection.bbox
        );
    }

    let reference = resolve_reference_height(&detection.label, calibration.override_height());
    let estimation = estimate(detection, calibration, focal_length_px);

    Ok(Analysis {
        label: detection.label.clone(),
        confidence: detection.confidence.clamp(0.0, 1.0),
        reference_height_meters: reference,
        shape: calibration.shape,
        estimation,
        source: SourceKind::Local,
    })
}

/// Remote-API path: the report already carries physical units.
///
/// Distance is an approximation: the object is assumed to fill
/// `screen_fraction` of the frame height.
pub fn normalize_remote(
    report: &RemoteReport,
    calibration: &CalibrationInput,
    frame_height_px: f64,
    focal_length_px: f64,
    screen_fraction: f64,
) -> Result<Analysis, NormalizeError> {
    check_frame_scale("frame height", frame_height_px)?;
    check_frame_scale("focal length", focal_length_px)?;

    if report.object.trim().is_empty() {
        return Err(NormalizeError::MalformedRemoteResponse(
            "missing 'object' label".to_string(),
        ));
    }

    let reported_height = cm_to_m(report.height_cm);
    let reference = calibration
        .override_height()
        .or(reported_height)
        .unwrap_or_else(|| ObjectSizePrior::for_label(&report.object).height);

    // A user calibration rescales the reported dimensions linearly
    let scale = match (calibration.override_height(), reported_height) {
        (Some(user), Some(reported)) => user / reported,
        _ => 1.0,
    };

    let reported_volume = report
        .volume_liters
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|liters| liters / 1000.0 * scale.powi(3));

    let derived_volume = || {
        let width = cm_to_m(report.width_cm)? * scale;
        let height = reported_height? * scale;
        let depth = cm_to_m(report.depth_cm).map(|d| d * scale).unwrap_or(width);
        Some(volume_from_dimensions(width, height, depth, calibration.shape))
    };

    let volume = reported_volume
        .or_else(derived_volume)
        .filter(|v| v.is_finite() && *v > 0.0);

    let distance = distance_from_height(
        frame_height_px * screen_fraction,
        reference,
        focal_length_px,
    );

    let estimation = EstimationResult {
        distance_meters: distance,
        volume_cubic_meters: volume,
    };

    if !estimation.is_complete() {
        warn!("Remote report for '{}' gave a partial estimate: {:?}", report.object, estimation);
    }

    Ok(Analysis {
        label: report.object.clone(),
        confidence: report.normalized_confidence(),
        reference_height_meters: reference,
        shape: calibration.shape,
        estimation,
        source: SourceKind::Remote,
    })
}
