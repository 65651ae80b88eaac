//! End-to-end mask pipeline testing
//!
//! Drives extraction, refinement, and compositing through the public API
//! with synthetic detection results, plus the error paths a caller hits
//! before any model is involved.

use bgcutout::{
    compose, extract_mask, refine_mask, BoundingBox, CutoutError, DetectionResult, Instance,
    InstanceMask, RemovalConfig, SubjectMask, PERSON_CLASS_ID,
};
use image::DynamicImage;

fn person(confidence: f32, bbox: BoundingBox, mask: Option<InstanceMask>) -> Instance {
    Instance {
        class_id: PERSON_CLASS_ID,
        confidence,
        bbox,
        mask,
    }
}

#[test]
fn box_only_detection_flows_through_to_alpha() {
    let detections = DetectionResult {
        instances: vec![person(0.9, BoundingBox::new(10.0, 10.0, 50.0, 50.0), None)],
    };

    let mask = extract_mask(100, 100, &detections, PERSON_CLASS_ID, 0.25);
    let refined = refine_mask(&mask).unwrap();
    let image = DynamicImage::new_rgb8(100, 100);
    let composed = compose(&image, &refined).unwrap();

    // interior of the box is opaque, corners are transparent
    assert_eq!(composed.get_pixel(30, 30)[3], 255);
    assert_eq!(composed.get_pixel(5, 5)[3], 0);
    assert_eq!(composed.get_pixel(90, 90)[3], 0);
}

#[test]
fn segmentation_mask_wins_over_its_bounding_box() {
    // soft mask covering only the left half of a 4x4 grid, scaled up to 8x8
    let mut data = vec![0.0f32; 16];
    for row in 0..4 {
        data[row * 4] = 0.9;
        data[row * 4 + 1] = 0.9;
    }
    let instance_mask = InstanceMask::new(data, (4, 4)).unwrap();

    let detections = DetectionResult {
        instances: vec![person(
            0.8,
            BoundingBox::new(0.0, 0.0, 8.0, 8.0),
            Some(instance_mask),
        )],
    };

    let mask = extract_mask(8, 8, &detections, PERSON_CLASS_ID, 0.25);
    let stats = mask.statistics();
    assert_eq!(stats.foreground_pixels, 32, "left half of 8x8");
}

#[test]
fn low_confidence_instances_contribute_nothing() {
    let detections = DetectionResult {
        instances: vec![person(0.1, BoundingBox::new(0.0, 0.0, 50.0, 50.0), None)],
    };

    let mask = extract_mask(100, 100, &detections, PERSON_CLASS_ID, 0.25);
    assert_eq!(mask.statistics().foreground_pixels, 0);
}

#[test]
fn overlapping_instances_union_into_one_mask() {
    let detections = DetectionResult {
        instances: vec![
            person(0.9, BoundingBox::new(0.0, 0.0, 30.0, 30.0), None),
            person(0.8, BoundingBox::new(20.0, 20.0, 60.0, 60.0), None),
        ],
    };

    let mask = extract_mask(100, 100, &detections, PERSON_CLASS_ID, 0.25);
    // union, not sum: overlap region stays 255
    assert!(mask.is_binary());
    let expected: usize = 30 * 30 + 40 * 40 - 10 * 10;
    assert_eq!(mask.statistics().foreground_pixels, expected);
}

#[test]
fn refinement_preserves_binary_values_and_extents() {
    let detections = DetectionResult {
        instances: vec![person(0.9, BoundingBox::new(20.0, 20.0, 80.0, 80.0), None)],
    };

    let mask = extract_mask(100, 100, &detections, PERSON_CLASS_ID, 0.25);
    let refined = refine_mask(&mask).unwrap();

    assert_eq!(refined.dimensions, mask.dimensions);
    assert!(refined.is_binary());
}

#[test]
fn empty_detection_yields_fully_transparent_output() {
    let mask = extract_mask(64, 64, &DetectionResult::empty(), PERSON_CLASS_ID, 0.25);
    let refined = refine_mask(&mask).unwrap();
    let composed = compose(&DynamicImage::new_rgb8(64, 64), &refined).unwrap();

    assert!(composed.pixels().all(|p| p[3] == 0));
}

#[test]
fn compose_rejects_mismatched_mask_dimensions() {
    let mask = SubjectMask::zeros(32, 32);
    let image = DynamicImage::new_rgb8(64, 64);

    let err = compose(&image, &mask).unwrap_err();
    assert!(matches!(err, CutoutError::DimensionMismatch { .. }));
}

#[test]
fn config_builder_rejects_bad_thresholds_at_the_boundary() {
    for bad in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
        let result = RemovalConfig::builder().confidence_threshold(bad).build();
        assert!(result.is_err(), "threshold {bad} must be rejected");
    }

    // both bounds are inclusive
    assert!(RemovalConfig::builder().confidence_threshold(0.0).build().is_ok());
    assert!(RemovalConfig::builder().confidence_threshold(1.0).build().is_ok());
}

#[cfg(feature = "onnx")]
mod with_backend {
    use super::*;
    use bgcutout::remove_background;
    use tempfile::TempDir;

    #[test]
    fn missing_input_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = RemovalConfig::builder()
            .model_dir(dir.path().join("models"))
            .build()
            .unwrap();

        let err = remove_background(
            dir.path().join("missing.jpg"),
            dir.path().join("out.png"),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, CutoutError::InputNotFound(_)));
    }

    #[test]
    fn unloadable_models_list_every_candidate() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.png");
        DynamicImage::new_rgb8(8, 8).save(&input).unwrap();

        let config = RemovalConfig::builder()
            .model_dir(dir.path().join("empty"))
            .build()
            .unwrap();

        let err =
            remove_background(&input, dir.path().join("out.png"), &config).unwrap_err();
        match err {
            CutoutError::ModelUnavailable(attempts) => {
                assert_eq!(attempts.len(), 3);
                assert!(attempts[0].identifier.starts_with("yolo11"));
            },
            other => panic!("expected ModelUnavailable, got {other}"),
        }
    }
}
