//! Greedy-match detection score and its aggregation across images and thresholds.

use crate::error::{Result, VesselError};
use crate::matching::{check_scores, match_predictions, AssignmentMatrix};
use crate::threshold::validate_thresholds;
use crate::types::{BoundingBox, Prediction, Target};
use serde::{Deserialize, Serialize};

/// True/false positive and false negative counts for one assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl MatchCounts {
    /// Count matches in an assignment matrix.
    pub fn from_assignment(mappings: &AssignmentMatrix) -> Self {
        Self {
            true_positives: mappings.true_positives(),
            false_positives: mappings.false_positives(),
            false_negatives: mappings.false_negatives(),
        }
    }

    /// `TP / (TP + FP + FN)`, or 0.0 when every count is zero.
    pub fn score(&self) -> f64 {
        let total = self.true_positives + self.false_positives + self.false_negatives;
        if total == 0 {
            return 0.0;
        }
        self.true_positives as f64 / total as f64
    }
}

/// Score one image at one IoU threshold.
///
/// Returns 1.0 when there are neither ground-truth nor predicted boxes and
/// 0.0 when exactly one side is empty. Otherwise predictions are greedily
/// matched and the score is `TP / (TP + FP + FN)`.
///
/// # Errors
///
/// Returns `Model` when `scores` and `pr_boxes` differ in length.
///
/// # Example
///
/// ```
/// use vessel_detect::metrics::score::calculate_map;
/// use vessel_detect::types::BoundingBox;
///
/// assert_eq!(calculate_map(&[], &[], &[], 0.5).unwrap(), 1.0);
///
/// let gt = vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0)];
/// let pr = vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0), BoundingBox::new(50.0, 50.0, 60.0, 60.0)];
/// let score = calculate_map(&gt, &pr, &[0.9, 0.8], 0.5).unwrap();
/// assert!((score - 0.5).abs() < 1e-10);
/// ```
pub fn calculate_map(
    gt_boxes: &[BoundingBox],
    pr_boxes: &[BoundingBox],
    scores: &[f64],
    threshold: f64,
) -> Result<f64> {
    check_scores(pr_boxes, scores)?;
    let score = match (gt_boxes.is_empty(), pr_boxes.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let mappings = match_predictions(gt_boxes, pr_boxes, scores, threshold)?;
            MatchCounts::from_assignment(&mappings).score()
        }
    };
    Ok(score)
}

/// Score a target/prediction pair at one IoU threshold.
pub fn score_image(target: &Target, prediction: &Prediction, threshold: f64) -> Result<f64> {
    calculate_map(
        &target.boxes,
        &prediction.boxes,
        &prediction.scores,
        threshold,
    )
}

/// Aggregate detection score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// `(threshold, mean score over images)` in threshold order
    pub per_threshold: Vec<(f64, f64)>,
    /// Mean of the per-threshold means
    pub map: f64,
    /// Number of images scored
    pub image_count: usize,
}

/// Collects per-image scores for every threshold, batch by batch.
#[derive(Debug, Clone)]
pub struct ScoreAccumulator {
    thresholds: Vec<f64>,
    scores: Vec<Vec<f64>>,
}

impl ScoreAccumulator {
    /// Create an accumulator for the given IoU thresholds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreshold` for an empty list or a value outside `[0, 1]`.
    pub fn new(thresholds: &[f64]) -> Result<Self> {
        validate_thresholds(thresholds)?;
        Ok(Self {
            thresholds: thresholds.to_vec(),
            scores: vec![Vec::new(); thresholds.len()],
        })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Number of images added so far.
    pub fn image_count(&self) -> usize {
        self.scores.first().map_or(0, Vec::len)
    }

    /// Score one image at every threshold.
    ///
    /// Nothing is recorded if the prediction is malformed.
    pub fn add(&mut self, target: &Target, prediction: &Prediction) -> Result<()> {
        let image_scores = self
            .thresholds
            .iter()
            .map(|&threshold| score_image(target, prediction, threshold))
            .collect::<Result<Vec<f64>>>()?;
        for (scores, score) in self.scores.iter_mut().zip(image_scores) {
            scores.push(score);
        }
        Ok(())
    }

    /// Score a batch of images at every threshold.
    pub fn add_batch(&mut self, targets: &[Target], predictions: &[Prediction]) -> Result<()> {
        if targets.len() != predictions.len() {
            return Err(VesselError::Model(format!(
                "got {} predictions for {} images",
                predictions.len(),
                targets.len()
            )));
        }
        targets
            .iter()
            .zip(predictions)
            .try_for_each(|(target, prediction)| self.add(target, prediction))
    }

    /// Average per threshold, then across thresholds.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataset` if no image was added.
    pub fn finish(&self) -> Result<ScoreReport> {
        let image_count = self.image_count();
        if image_count == 0 {
            return Err(VesselError::EmptyDataset(
                "no images were scored".to_string(),
            ));
        }

        let per_threshold: Vec<(f64, f64)> = self
            .thresholds
            .iter()
            .zip(&self.scores)
            .map(|(&threshold, scores)| (threshold, mean(scores)))
            .collect();
        let map = mean(&per_threshold.iter().map(|&(_, s)| s).collect::<Vec<_>>());

        Ok(ScoreReport {
            per_threshold,
            map,
            image_count,
        })
    }
}

/// Score a full evaluation set.
///
/// Every image counts equally at a given threshold, and every threshold
/// counts equally in the final value.
///
/// # Arguments
///
/// * `targets` - Ground truth per image
/// * `predictions` - Predictions per image, parallel to `targets`
/// * `thresholds` - IoU thresholds
pub fn score_dataset(
    targets: &[Target],
    predictions: &[Prediction],
    thresholds: &[f64],
) -> Result<ScoreReport> {
    let mut accumulator = ScoreAccumulator::new(thresholds)?;
    accumulator.add_batch(targets, predictions)?;
    accumulator.finish()
}

/// Average already computed per-image scores.
///
/// `scores_per_threshold[t][i]` is the score of image `i` at threshold `t`.
pub fn aggregate_scores(thresholds: &[f64], scores_per_threshold: &[Vec<f64>]) -> Result<ScoreReport> {
    validate_thresholds(thresholds)?;
    if thresholds.len() != scores_per_threshold.len() {
        return Err(VesselError::InvalidThreshold(format!(
            "{} thresholds but {} score lists",
            thresholds.len(),
            scores_per_threshold.len()
        )));
    }
    let accumulator = ScoreAccumulator {
        thresholds: thresholds.to_vec(),
        scores: scores_per_threshold.to_vec(),
    };
    accumulator.finish()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
