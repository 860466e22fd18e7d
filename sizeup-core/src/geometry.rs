//! Pinhole-camera distance and bounding-box volume estimates
//!
//! All functions are pure. Unusable inputs give `None` instead of NaN,
//! infinity or a negative number, so callers can render "unavailable"
//! without checking the arithmetic themselves.

use crate::priors::ObjectSizePrior;
use crate::types::{BoundingBox, CalibrationInput, Detection, EstimationResult, Shape};
use std::f64::consts::PI;
use tracing::debug;

fn positive_finite(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Distance to an object of known height from its on-screen height.
///
/// `distance = reference_real_height_m * focal_length_px / pixel_height`
pub fn distance_from_height(
    pixel_height: f64,
    reference_real_height_m: f64,
    focal_length_px: f64,
) -> Option<f64> {
    let pixel_height = positive_finite(pixel_height)?;
    let reference = positive_finite(reference_real_height_m)?;
    let focal = positive_finite(focal_length_px)?;

    positive_finite(reference * focal / pixel_height)
}

/// Volume in cubic meters of an object whose bounding box spans
/// `reference_real_height_m` vertically. Depth is taken equal to the
/// scaled width since nothing measures it.
pub fn volume_from_bounding_box(
    bbox: &BoundingBox,
    reference_real_height_m: f64,
    shape: Shape,
) -> Option<f64> {
    let box_height = positive_finite(bbox.height)?;
    let box_width = positive_finite(bbox.width)?;
    let reference = positive_finite(reference_real_height_m)?;

    let pixel_to_meter = reference / box_height;
    let real_width = box_width * pixel_to_meter;
    let real_depth = real_width;

    let volume = match shape {
        Shape::Cylinder => PI * (real_width / 2.0).powi(2) * reference,
        Shape::Box => real_width * reference * real_depth,
    };

    positive_finite(volume)
}

/// Real-world height to scale by: the user's calibration when it is
/// usable, otherwise the prior for `label`.
pub fn resolve_reference_height(label: &str, user_override_m: Option<f64>) -> f64 {
    match user_override_m.and_then(positive_finite) {
        Some(height) => height,
        None => ObjectSizePrior::for_label(label).height,
    }
}

/// Run both estimators for one local detection
pub fn estimate(
    detection: &Detection,
    calibration: &CalibrationInput,
    focal_length_px: f64,
) -> EstimationResult {
    let reference = resolve_reference_height(&detection.label, calibration.override_height());

    let result = EstimationResult {
        distance_meters: distance_from_height(detection.bbox.height, reference, focal_length_px),
        volume_cubic_meters: volume_from_bounding_box(&detection.bbox, reference, calibration.shape),
    };

    debug!(
        "Estimated '{}' with reference height {:.3} m: {:?}",
        detection.label, reference, result
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_distance_formula() {
        let distance = distance_from_height(100.0, 1.0, 1000.0).unwrap();
        assert!((distance - 10.0).abs() < EPS);
    }

    #[test]
    fn test_distance_rejects_non_positive_pixels() {
        assert_eq!(distance_from_height(0.0, 1.0, 1000.0), None);
        assert_eq!(distance_from_height(-3.0, 1.0, 1000.0), None);
    }

    #[test]
    fn test_distance_rejects_bad_reference() {
        assert_eq!(distance_from_height(100.0, 0.0, 1000.0), None);
        assert_eq!(distance_from_height(100.0, -0.5, 1000.0), None);
        assert_eq!(distance_from_height(100.0, f64::NAN, 1000.0), None);
    }

    #[test]
    fn test_distance_rejects_non_finite_result() {
        assert_eq!(distance_from_height(f64::MIN_POSITIVE, f64::MAX, f64::MAX), None);
        assert_eq!(distance_from_height(100.0, 1.0, f64::INFINITY), None);
    }

    #[test]
    fn test_box_volume() {
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 200.0);
        let volume = volume_from_bounding_box(&bbox, 1.0, Shape::Box).unwrap();
        assert!((volume - 0.125).abs() < EPS);
    }

    #[test]
    fn test_cylinder_volume() {
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 200.0);
        let volume = volume_from_bounding_box(&bbox, 1.0, Shape::Cylinder).unwrap();
        assert!((volume - PI * 0.0625).abs() < EPS);
        assert!((volume - 0.19635).abs() < 1e-5);
    }

    #[test]
    fn test_volume_zero_height_is_unavailable() {
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 0.0);
        assert_eq!(volume_from_bounding_box(&bbox, 1.0, Shape::Box), None);
        assert_eq!(volume_from_bounding_box(&bbox, 1.0, Shape::Cylinder), None);
    }

    #[test]
    fn test_volume_zero_width_is_unavailable() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.0, 50.0);
        assert_eq!(volume_from_bounding_box(&bbox, 1.0, Shape::Box), None);
    }

    #[test]
    fn test_resolve_reference_height() {
        assert_eq!(resolve_reference_height("bottle", None), 0.25);
        assert_eq!(resolve_reference_height("unknown-thing", None), 0.3);
        assert_eq!(resolve_reference_height("bottle", Some(0.4)), 0.4);
        assert_eq!(resolve_reference_height("bottle", Some(0.0)), 0.25);
        assert_eq!(resolve_reference_height("bottle", Some(f64::INFINITY)), 0.25);
    }

    #[test]
    fn test_estimate_cup_without_override() {
        let cup = Detection::new("cup", 0.9, BoundingBox::new(10.0, 20.0, 80.0, 120.0));
        let result = estimate(&cup, &CalibrationInput::default(), 1080.0);

        let distance = result.distance_meters.unwrap();
        assert!((distance - 0.12 * 1080.0 / 120.0).abs() < EPS);

        // ratio 0.001 m/px -> 0.08 m wide and deep
        let volume = result.volume_cubic_meters.unwrap();
        assert!((volume - 0.08 * 0.12 * 0.08).abs() < EPS);
    }

    #[test]
    fn test_estimate_flat_box_is_unavailable() {
        let cup = Detection::new("cup", 0.9, BoundingBox::new(10.0, 20.0, 80.0, 0.0));
        let result = estimate(&cup, &CalibrationInput::default(), 1080.0);
        assert_eq!(result, EstimationResult::unavailable());
    }
}
