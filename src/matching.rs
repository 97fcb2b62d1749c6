//! Greedy one-to-one matching of predictions against ground truth.

use crate::error::{Result, VesselError};
use crate::metrics::iou::{calculate_iou_matrix, IouMatrix};
use crate::types::BoundingBox;

/// Binary ground-truth × prediction assignment.
///
/// At most one cell per row and per column is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl AssignmentMatrix {
    fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_assigned(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.cols + col]
    }

    pub fn row_assigned(&self, row: usize) -> bool {
        (0..self.cols).any(|col| self.is_assigned(row, col))
    }

    pub fn col_assigned(&self, col: usize) -> bool {
        (0..self.rows).any(|row| self.is_assigned(row, col))
    }

    /// `(row, col)` pairs of every assignment, in row-major order.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| (row, col)))
            .filter(|&(row, col)| self.is_assigned(row, col))
            .collect()
    }

    /// Number of set cells.
    pub fn true_positives(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Number of prediction columns with no assignment.
    pub fn false_positives(&self) -> usize {
        (0..self.cols).filter(|&col| !self.col_assigned(col)).count()
    }

    /// Number of ground-truth rows with no assignment.
    pub fn false_negatives(&self) -> usize {
        (0..self.rows).filter(|&row| !self.row_assigned(row)).count()
    }
}

/// Indices of `scores` from highest to lowest.
///
/// This is a stable ascending sort reversed, so equal scores come out with
/// the higher original index first. Ordering follows IEEE total order, so a
/// positive NaN ranks above every number.
pub fn score_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    order.reverse();
    order
}

/// Index of the largest value; ties resolve to the highest index.
fn last_argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, &v)| match best {
            Some((_, best_v)) if v < best_v => best,
            _ => Some((idx, v)),
        })
        .map(|(idx, _)| idx)
}

/// Greedily assign prediction columns to ground-truth rows.
///
/// Columns are visited left to right and are expected to be in descending
/// score order already. Each column takes the still-unassigned row with the
/// highest IoU. A column whose available entries are all zero is left
/// unmatched. Ties pick the highest row index.
///
/// # Example
///
/// ```
/// use vessel_detect::matching::get_mappings;
/// use vessel_detect::metrics::iou::IouMatrix;
///
/// let iou = IouMatrix::from_rows(&[vec![0.9, 0.8], vec![0.0, 0.7]]);
/// let mappings = get_mappings(&iou);
/// assert_eq!(mappings.pairs(), vec![(0, 0), (1, 1)]);
/// ```
pub fn get_mappings(iou: &IouMatrix) -> AssignmentMatrix {
    let mut mappings = AssignmentMatrix::zeros(iou.rows(), iou.cols());
    let mut taken = vec![false; iou.rows()];

    for col in 0..iou.cols() {
        let available: Vec<f64> = iou
            .column(col)
            .into_iter()
            .zip(&taken)
            .map(|(v, &is_taken)| if is_taken { 0.0 } else { v })
            .collect();

        if available.iter().all(|&v| v == 0.0) {
            continue;
        }

        if let Some(row) = last_argmax(&available) {
            mappings.cells[row * iou.cols() + col] = true;
            taken[row] = true;
        }
    }

    mappings
}

/// Match predictions to ground truth at one IoU threshold.
///
/// Predictions are reordered by descending score before matching, so column
/// `j` of the result refers to the `j`-th most confident prediction (see
/// [`score_order`]). IoU values not strictly above `threshold` never match.
///
/// # Arguments
///
/// * `gt_boxes` - Ground-truth boxes for one image
/// * `pr_boxes` - Predicted boxes for the same image
/// * `scores` - Confidence per predicted box
/// * `threshold` - IoU threshold
///
/// # Errors
///
/// Returns `Model` when `scores` and `pr_boxes` differ in length.
pub fn match_predictions(
    gt_boxes: &[BoundingBox],
    pr_boxes: &[BoundingBox],
    scores: &[f64],
    threshold: f64,
) -> Result<AssignmentMatrix> {
    check_scores(pr_boxes, scores)?;
    let ordered: Vec<BoundingBox> = score_order(scores)
        .into_iter()
        .map(|idx| pr_boxes[idx])
        .collect();

    let iou = calculate_iou_matrix(gt_boxes, &ordered).zero_below(threshold);
    Ok(get_mappings(&iou))
}

/// Predicted boxes and their scores must be parallel.
pub fn check_scores(pr_boxes: &[BoundingBox], scores: &[f64]) -> Result<()> {
    if pr_boxes.len() != scores.len() {
        return Err(VesselError::Model(format!(
            "{} predicted boxes but {} scores",
            pr_boxes.len(),
            scores.len()
        )));
    }
    Ok(())
}
