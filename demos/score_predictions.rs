//! Scoring example: greedy matching and the thresholded detection score.

use vessel_detect::matching::match_predictions;
use vessel_detect::metrics::iou::calculate_iou;
use vessel_detect::metrics::score::{calculate_map, score_dataset};
use vessel_detect::threshold::default_iou_thresholds;
use vessel_detect::types::{BoundingBox, Prediction, Target};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Detection Score Example ===\n");

    println!("1. IoU Calculation");
    let ship = BoundingBox::new(40.0, 40.0, 90.0, 80.0);
    let guess = BoundingBox::new(45.0, 42.0, 92.0, 85.0);
    println!("   IoU between ship and prediction: {:.4}", calculate_iou(&ship, &guess));
    println!();

    println!("2. Greedy matching");
    let gt = vec![ship, BoundingBox::new(150.0, 150.0, 180.0, 170.0)];
    let pr = vec![guess, BoundingBox::new(200.0, 10.0, 230.0, 30.0)];
    let scores = vec![0.92, 0.40];
    let mappings = match_predictions(&gt, &pr, &scores, 0.5)?;
    println!("   Matched (ship, prediction rank): {:?}", mappings.pairs());
    println!(
        "   TP={} FP={} FN={}",
        mappings.true_positives(),
        mappings.false_positives(),
        mappings.false_negatives()
    );
    println!("   Score at IoU > 0.5: {:.4}", calculate_map(&gt, &pr, &scores, 0.5)?);
    println!();

    println!("3. Dataset score over thresholds");
    let thresholds = default_iou_thresholds();
    let targets = vec![
        Target::from_boxes(gt.clone()),
        Target::empty(),
        Target::from_boxes(vec![ship]),
    ];
    let predictions = vec![
        Prediction::new(pr.clone(), scores.clone()),
        Prediction::default(),
        Prediction::default(),
    ];
    let report = score_dataset(&targets, &predictions, &thresholds)?;
    println!("   Threshold | Mean score");
    println!("   ----------|-----------");
    for (threshold, score) in &report.per_threshold {
        println!("   {:>9.2} | {:>9.4}", threshold, score);
    }
    println!("   mAP over {} images: {:.4}", report.image_count, report.map);
    println!();

    println!("4. Report as JSON");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
