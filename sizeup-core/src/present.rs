//! Human-readable rendering of an analysis

use crate::types::Analysis;
use std::fmt;

const UNAVAILABLE: &str = "unavailable";

/// A volume in the unit it should be shown in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeDisplay {
    Milliliters(f64),
    Liters(f64),
}

impl VolumeDisplay {
    /// Anything under one liter, after rounding to whole milliliters, is
    /// shown in milliliters
    pub fn from_cubic_meters(volume_m3: f64) -> Self {
        let milliliters = (volume_m3 * 1_000_000.0).round();
        if milliliters < 1000.0 {
            VolumeDisplay::Milliliters(milliliters)
        } else {
            VolumeDisplay::Liters(volume_m3 * 1000.0)
        }
    }
}

/// Up to two decimals, trailing zeros dropped
fn trim_decimals(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

impl fmt::Display for VolumeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeDisplay::Milliliters(ml) => write!(f, "{:.0} ml", ml),
            VolumeDisplay::Liters(l) => {
                let amount = trim_decimals(*l);
                let unit = if amount == "1" { "liter" } else { "liters" };
                write!(f, "{} {}", amount, unit)
            }
        }
    }
}

pub fn format_volume(volume_m3: f64) -> String {
    VolumeDisplay::from_cubic_meters(volume_m3).to_string()
}

pub fn format_distance(distance_m: f64) -> String {
    format!("{:.2} m", distance_m)
}

/// Multi-line report for one capture
pub fn render(analysis: &Analysis) -> String {
    let distance = analysis
        .estimation
        .distance_meters
        .map(format_distance)
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let volume = analysis
        .estimation
        .volume_cubic_meters
        .map(format_volume)
        .unwrap_or_else(|| UNAVAILABLE.to_string());

    format!(
        "Detected: {}\nConfidence: {:.0}%\nApproximate distance: {}\nApproximate volume: {} ({})\n",
        analysis.label,
        analysis.confidence * 100.0,
        distance,
        volume,
        analysis.shape,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EstimationResult, Shape, SourceKind};

    #[test]
    fn test_volume_unit_threshold() {
        assert_eq!(format_volume(0.0008), "800 ml");
        assert_eq!(format_volume(0.0015), "1.5 liters");
        assert_eq!(format_volume(0.125), "125 liters");
    }

    #[test]
    fn test_volume_display_variant() {
        assert!(matches!(VolumeDisplay::from_cubic_meters(0.0002), VolumeDisplay::Milliliters(_)));
        assert!(matches!(VolumeDisplay::from_cubic_meters(0.19635), VolumeDisplay::Liters(_)));
        assert_eq!(format_volume(0.19635), "196.35 liters");
    }

    #[test]
    fn test_volume_rounds_before_choosing_unit() {
        assert_eq!(format_volume(0.0009996), "1 liter");
        assert_eq!(format_volume(0.0009994), "999 ml");
        assert_eq!(format_volume(0.001 + 1e-12), "1 liter");
        assert_eq!(format_volume(0.002), "2 liters");
        assert!(matches!(VolumeDisplay::from_cubic_meters(0.0009996), VolumeDisplay::Liters(_)));
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(1.254), "1.25 m");
    }

    #[test]
    fn test_render_full() {
        let analysis = Analysis {
            label: "cup".to_string(),
            confidence: 0.87,
            reference_height_meters: 0.12,
            shape: Shape::Cylinder,
            estimation: EstimationResult {
                distance_meters: Some(1.08),
                volume_cubic_meters: Some(0.0004),
            },
            source: SourceKind::Local,
        };
        let text = render(&analysis);
        assert!(text.contains("Detected: cup"));
        assert!(text.contains("Confidence: 87%"));
        assert!(text.contains("Approximate distance: 1.08 m"));
        assert!(text.contains("Approximate volume: 400 ml (cylinder)"));
    }

    #[test]
    fn test_render_unavailable() {
        let analysis = Analysis {
            label: "cup".to_string(),
            confidence: 0.5,
            reference_height_meters: 0.12,
            shape: Shape::Box,
            estimation: EstimationResult::unavailable(),
            source: SourceKind::Remote,
        };
        let text = render(&analysis);
        assert!(text.contains("Approximate distance: unavailable"));
        assert!(text.contains("Approximate volume: unavailable"));
        assert!(!text.contains("NaN"));
    }
}
