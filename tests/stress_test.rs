//! Stress tests with large mask tables and crowded images.

use vessel_detect::matching::match_predictions;
use vessel_detect::metrics::score::{calculate_map, score_dataset};
use vessel_detect::rle::rle_to_bbox;
use vessel_detect::targets::filter_masks;
use vessel_detect::types::{BoundingBox, MaskRecord, Prediction, Target, ORIGINAL_FRAME};

/// Mask covering `cols` columns and `rows` rows from `(row, col)` in the 768 frame.
fn rectangle_mask(row: u32, col: u32, rows: u32, cols: u32) -> String {
    (col..col + cols)
        .map(|c| format!("{} {}", c * 768 + row + 1, rows))
        .collect::<Vec<_>>()
        .join(" ")
}

fn grid_boxes(count: usize) -> Vec<BoundingBox> {
    (0..count)
        .map(|i| {
            let x = (i % 50) as f64 * 15.0;
            let y = (i / 50) as f64 * 15.0;
            BoundingBox::new(x, y, x + 10.0, y + 10.0)
        })
        .collect()
}

#[test]
fn test_1000_boxes_single_image() {
    let gt = grid_boxes(1000);
    let scores: Vec<f64> = (0..1000).map(|i| 1.0 - i as f64 / 1000.0).collect();

    assert_eq!(calculate_map(&gt, &gt, &scores, 0.5).unwrap(), 1.0);

    let mappings = match_predictions(&gt, &gt, &scores, 0.75).unwrap();
    assert_eq!(mappings.true_positives(), 1000);
}

#[test]
fn test_shifted_predictions_half_match() {
    let gt = grid_boxes(500);
    let mut pr = gt.clone();
    // shift every second prediction away from its ship
    for (i, b) in pr.iter_mut().enumerate() {
        if i % 2 == 1 {
            *b = BoundingBox::new(b.x_min + 5.0, b.y_min, b.x_max + 5.0, b.y_max);
        }
    }
    let scores = vec![0.5; pr.len()];

    // shifted boxes have IoU 1/3 with their ship and none with neighbours
    let score = calculate_map(&gt, &pr, &scores, 0.5).unwrap();
    let expected = 250.0 / (250.0 + 250.0 + 250.0);
    assert!((score - expected).abs() < 1e-12);

    assert_eq!(calculate_map(&gt, &pr, &scores, 0.3).unwrap(), 1.0);
}

#[test]
fn test_many_images_dataset_score() {
    let targets: Vec<Target> = (0..2000)
        .map(|i| {
            if i % 4 == 0 {
                Target::empty()
            } else {
                Target::from_boxes(grid_boxes(i % 7 + 1))
            }
        })
        .collect();
    let predictions: Vec<Prediction> = targets
        .iter()
        .map(|t| Prediction::new(t.boxes.clone(), vec![0.9; t.len()]))
        .collect();

    let report = score_dataset(&targets, &predictions, &[0.5, 0.55, 0.6, 0.65, 0.7, 0.75]).unwrap();
    assert_eq!(report.image_count, 2000);
    assert_eq!(report.map, 1.0);
}

#[test]
fn test_large_mask_table() {
    let mut records = Vec::new();
    for i in 0..5000u32 {
        let image_id = format!("{:06}.jpg", i / 2);
        let mask = match i % 5 {
            0 => None,
            // single column: rejected
            1 => Some("5 3".to_string()),
            _ => Some(rectangle_mask((i % 700) + 10, (i % 600) + 10, 20, 5)),
        };
        records.push(MaskRecord {
            image_id,
            encoded_pixels: mask,
        });
    }

    let filtered = filter_masks(&records, true);
    assert_eq!(filtered.stats.total_records, 5000);
    assert_eq!(filtered.stats.dropped_null_records, 1000);
    assert_eq!(
        filtered.stats.kept_images() + filtered.stats.rejected_images,
        filtered.stats.grouped_images
    );
    for idx in filtered.ids() {
        let target = filtered.target(idx, ORIGINAL_FRAME).unwrap();
        assert!(target.boxes.iter().all(|b| b.is_valid_in(ORIGINAL_FRAME)));
    }
}

#[test]
fn test_long_rle_string() {
    // 700 columns of a single large ship
    let rle = rectangle_mask(30, 20, 500, 700);
    let bbox = rle_to_bbox(&rle, ORIGINAL_FRAME).unwrap();
    assert_eq!(bbox, BoundingBox::new(20.0, 30.0, 719.0, 530.0));
}
