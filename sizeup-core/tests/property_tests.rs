use proptest::prelude::*;
use sizeup_core::geometry::{distance_from_height, volume_from_bounding_box};
use sizeup_core::present::{format_volume, VolumeDisplay};
use sizeup_core::types::{BoundingBox, Shape};

proptest! {
    #[test]
    fn test_distance_positive_for_positive_inputs(
        pixel_height in 1e-3f64..1e5,
        reference in 1e-3f64..100.0,
        focal in 1.0f64..1e4,
    ) {
        let distance = distance_from_height(pixel_height, reference, focal);
        prop_assert!(distance.is_some());
        let distance = distance.unwrap();
        prop_assert!(distance.is_finite());
        prop_assert!(distance > 0.0);
    }

    #[test]
    fn test_distance_none_for_non_positive_pixels(
        pixel_height in -1e5f64..=0.0,
        reference in 1e-3f64..100.0,
        focal in 1.0f64..1e4,
    ) {
        prop_assert_eq!(distance_from_height(pixel_height, reference, focal), None);
    }

    #[test]
    fn test_volume_never_nan_or_negative(
        width in -1e4f64..1e4,
        height in -1e4f64..1e4,
        reference in -10.0f64..10.0,
        cylinder in any::<bool>(),
    ) {
        let shape = if cylinder { Shape::Cylinder } else { Shape::Box };
        let bbox = BoundingBox::new(0.0, 0.0, width, height);
        if let Some(volume) = volume_from_bounding_box(&bbox, reference, shape) {
            prop_assert!(volume.is_finite());
            prop_assert!(volume > 0.0);
        }
        if height <= 0.0 || width <= 0.0 || reference <= 0.0 {
            prop_assert_eq!(volume_from_bounding_box(&bbox, reference, shape), None);
        }
    }

    #[test]
    fn test_cylinder_smaller_than_box(
        width in 1.0f64..1e4,
        height in 1.0f64..1e4,
        reference in 0.01f64..10.0,
    ) {
        let bbox = BoundingBox::new(0.0, 0.0, width, height);
        let cube = volume_from_bounding_box(&bbox, reference, Shape::Box);
        let cylinder = volume_from_bounding_box(&bbox, reference, Shape::Cylinder);
        if let (Some(cube), Some(cylinder)) = (cube, cylinder) {
            // pi/4 of the enclosing box
            prop_assert!(cylinder < cube);
            prop_assert!((cylinder / cube - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
        }
    }

    #[test]
    fn test_volume_display_unit_matches_threshold(volume in 1e-7f64..10.0) {
        let text = format_volume(volume);
        match VolumeDisplay::from_cubic_meters(volume) {
            VolumeDisplay::Milliliters(ml) => {
                prop_assert!(text.ends_with(" ml"));
                prop_assert!(ml < 1000.0);
            }
            VolumeDisplay::Liters(_) => {
                prop_assert!(text.ends_with(" liters") || text.ends_with(" liter"));
            }
        }
    }
}
