//! Error handling and validation tests.

use vessel_detect::config::TrainingParams;
use vessel_detect::error::VesselError;
use vessel_detect::loader::{load_masks_from_file, load_masks_from_str};
use vessel_detect::metrics::score::{aggregate_scores, score_dataset, ScoreAccumulator};
use vessel_detect::rle::{encode_mask, parse_runs, rle_to_bbox};
use vessel_detect::targets::{make_target, train_valid_split, validate_mask, TestSize};
use vessel_detect::threshold::{generate_threshold_range, validate_thresholds};
use vessel_detect::types::{Frame, Prediction, Target, ORIGINAL_FRAME};

// ============================================================================
// RLE ERROR TESTS
// ============================================================================

#[test]
fn test_non_integer_token() {
    match rle_to_bbox("12 three", Frame::new(10, 10)) {
        Err(VesselError::MalformedRle(msg)) => assert!(msg.contains("three")),
        other => panic!("Expected MalformedRle, got {:?}", other),
    }
}

#[test]
fn test_odd_token_count() {
    assert!(matches!(
        rle_to_bbox("1 2 3", Frame::new(10, 10)),
        Err(VesselError::MalformedRle(_))
    ));
}

#[test]
fn test_empty_rle() {
    assert!(matches!(parse_runs("   "), Err(VesselError::MalformedRle(_))));
}

#[test]
fn test_negative_start_is_malformed() {
    assert!(matches!(parse_runs("-5 3"), Err(VesselError::MalformedRle(_))));
}

#[test]
fn test_mask_past_last_column() {
    // starts in column 9 and runs two columns further
    match rle_to_bbox("100 15", Frame::new(10, 10)) {
        Err(VesselError::InvalidGeometry(msg)) => assert!(msg.contains("x_max")),
        other => panic!("Expected InvalidGeometry, got {:?}", other),
    }
}

#[test]
fn test_degenerate_frame() {
    assert!(matches!(
        rle_to_bbox("1 1", Frame::new(0, 10)),
        Err(VesselError::InvalidGeometry(_))
    ));
}

#[test]
fn test_encode_wrong_size() {
    assert!(matches!(
        encode_mask(&[0, 1, 1], Frame::new(2, 2)),
        Err(VesselError::InvalidGeometry(_))
    ));
}

// ============================================================================
// TARGET ERROR TESTS
// ============================================================================

#[test]
fn test_validate_mask_degenerate_box() {
    assert!(matches!(
        validate_mask("5 3", ORIGINAL_FRAME),
        Err(VesselError::InvalidBox(_))
    ));
}

#[test]
fn test_validate_mask_propagates_decode_error() {
    assert!(matches!(
        validate_mask("x", ORIGINAL_FRAME),
        Err(VesselError::MalformedRle(_))
    ));
}

#[test]
fn test_make_target_propagates_decode_error() {
    let masks = vec![Some("1 2 3".to_string())];
    assert!(make_target(&masks, ORIGINAL_FRAME).is_err());
}

#[test]
fn test_split_too_large() {
    let ids: Vec<usize> = (0..5).collect();
    assert!(matches!(
        train_valid_split(&ids, TestSize::Count(5), 0),
        Err(VesselError::InvalidConfig(_))
    ));
    assert!(matches!(
        train_valid_split(&ids, TestSize::Count(0), 0),
        Err(VesselError::InvalidConfig(_))
    ));
}

#[test]
fn test_split_of_empty_ids() {
    assert!(train_valid_split(&[], TestSize::Fraction(0.1), 0).is_err());
}

// ============================================================================
// LOADER ERROR TESTS
// ============================================================================

#[test]
fn test_missing_file() {
    let result = load_masks_from_file("/path/that/does/not/exist.csv");
    assert!(result.is_err(), "Should fail on missing file");
}

#[test]
fn test_missing_image_id_column() {
    let csv = "Name,EncodedPixels\na.jpg,1 2\n";
    match load_masks_from_str(csv) {
        Err(VesselError::MissingColumn(col)) => assert_eq!(col, "ImageId"),
        other => panic!("Expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_header_only_table() {
    let records = load_masks_from_str("ImageId,EncodedPixels\n").unwrap();
    assert!(records.is_empty());
}

// ============================================================================
// THRESHOLD AND SCORING ERROR TESTS
// ============================================================================

#[test]
fn test_threshold_too_high() {
    assert!(matches!(
        validate_thresholds(&[0.5, 1.5]),
        Err(VesselError::InvalidThreshold(_))
    ));
}

#[test]
fn test_threshold_nan() {
    assert!(validate_thresholds(&[f64::NAN]).is_err());
}

#[test]
fn test_threshold_range_zero_steps() {
    assert!(generate_threshold_range(0.5, 0.95, 0).is_err());
}

#[test]
fn test_threshold_range_inverted() {
    match generate_threshold_range(0.9, 0.5, 5) {
        Err(VesselError::InvalidThreshold(msg)) => assert!(msg.contains("must be <=")),
        other => panic!("Expected InvalidThreshold, got {:?}", other),
    }
}

#[test]
fn test_score_dataset_mismatched_lengths() {
    let result = score_dataset(&[Target::empty(), Target::empty()], &[Prediction::default()], &[0.5]);
    assert!(matches!(result, Err(VesselError::Model(_))));
}

#[test]
fn test_score_dataset_no_images() {
    assert!(matches!(
        score_dataset(&[], &[], &[0.5]),
        Err(VesselError::EmptyDataset(_))
    ));
}

#[test]
fn test_aggregate_mismatched_lists() {
    assert!(aggregate_scores(&[0.5, 0.6], &[vec![1.0]]).is_err());
}

#[test]
fn test_accumulator_rejects_out_of_range() {
    assert!(ScoreAccumulator::new(&[-0.1]).is_err());
}

// ============================================================================
// CONFIG ERROR TESTS
// ============================================================================

#[test]
fn test_config_missing_file() {
    assert!(matches!(
        TrainingParams::from_file("/path/that/does/not/exist.json"),
        Err(VesselError::IoError(_))
    ));
}

#[test]
fn test_config_bad_test_size() {
    assert!(matches!(
        TrainingParams::from_json(r#"{"test_size": 1.5}"#),
        Err(VesselError::InvalidConfig(_))
    ));
}

#[test]
fn test_config_zero_resample_attempts() {
    assert!(matches!(
        TrainingParams::from_json(r#"{"max_resample_attempts": 0}"#),
        Err(VesselError::InvalidConfig(_))
    ));
}

#[test]
fn test_config_wrong_type() {
    assert!(matches!(
        TrainingParams::from_json(r#"{"batch_size": "twelve"}"#),
        Err(VesselError::JsonError(_))
    ));
}

#[test]
fn test_error_messages() {
    let err = VesselError::NoValidSample { attempts: 100 };
    assert_eq!(err.to_string(), "No valid sample after 100 attempts");

    let err = VesselError::NonFiniteLoss {
        total: f64::NAN,
        components: "loss_objectness=NaN".to_string(),
    };
    assert!(err.to_string().contains("loss_objectness=NaN"));
}
