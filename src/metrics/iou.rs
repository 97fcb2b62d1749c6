//! Intersection over Union (IoU) calculation.

use crate::types::BoundingBox;

/// Align corners so every box has its min-corner first.
///
/// # Example
///
/// ```
/// use vessel_detect::metrics::iou::align_coordinates;
/// use vessel_detect::types::BoundingBox;
///
/// let aligned = align_coordinates(&[BoundingBox::new(10.0, 0.0, 0.0, 10.0)]);
/// assert_eq!(aligned[0], BoundingBox::new(0.0, 0.0, 10.0, 10.0));
/// ```
pub fn align_coordinates(boxes: &[BoundingBox]) -> Vec<BoundingBox> {
    boxes.iter().map(BoundingBox::aligned).collect()
}

/// Calculate the Intersection over Union (IoU) between two `(x1, y1, x2, y2)` boxes.
///
/// Both boxes are expected to be aligned. Returns a value between 0.0
/// (no overlap) and 1.0 (perfect overlap); a zero-area union gives 0.0.
///
/// # Example
///
/// ```
/// use vessel_detect::metrics::iou::calculate_iou;
/// use vessel_detect::types::BoundingBox;
///
/// let bbox1 = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// let bbox2 = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
/// let iou = calculate_iou(&bbox1, &bbox2);
/// assert!(iou > 0.0 && iou < 1.0);
/// ```
pub fn calculate_iou(bbox1: &BoundingBox, bbox2: &BoundingBox) -> f64 {
    let x_left = bbox1.x_min.max(bbox2.x_min);
    let y_top = bbox1.y_min.max(bbox2.y_min);
    let x_right = bbox1.x_max.min(bbox2.x_max);
    let y_bottom = bbox1.y_max.min(bbox2.y_max);

    let intersection_area = (x_right - x_left).max(0.0) * (y_bottom - y_top).max(0.0);
    let union_area = bbox1.area() + bbox2.area() - intersection_area;

    if union_area <= 0.0 {
        return 0.0;
    }

    intersection_area / union_area
}

/// Pairwise IoU between ground-truth rows and prediction columns.
#[derive(Debug, Clone, PartialEq)]
pub struct IouMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl IouMatrix {
    /// Build a matrix from row-major values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, values: Vec<f64>) -> Self {
        assert_eq!(values.len(), rows * cols, "IoU matrix shape mismatch");
        Self { rows, cols, values }
    }

    /// Build a matrix from nested rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let values: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_row_major(rows.len(), cols, values)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// Values of one prediction column, top to bottom.
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|row| self.get(row, col)).collect()
    }

    /// Zero every entry that is not strictly above `threshold`.
    pub fn zero_below(mut self, threshold: f64) -> Self {
        for v in &mut self.values {
            if !(*v > threshold) {
                *v = 0.0;
            }
        }
        self
    }
}

/// Calculate the IoU matrix between two sets of boxes.
///
/// Corners are aligned first. `result.get(i, j)` is the IoU between
/// `gt[i]` and `pr[j]`.
///
/// # Example
///
/// ```
/// use vessel_detect::metrics::iou::calculate_iou_matrix;
/// use vessel_detect::types::BoundingBox;
///
/// let gt = vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0)];
/// let pr = vec![BoundingBox::new(5.0, 5.0, 15.0, 15.0), BoundingBox::new(0.0, 0.0, 10.0, 10.0)];
/// let matrix = calculate_iou_matrix(&gt, &pr);
/// assert_eq!((matrix.rows(), matrix.cols()), (1, 2));
/// assert!((matrix.get(0, 1) - 1.0).abs() < 1e-10);
/// ```
pub fn calculate_iou_matrix(gt: &[BoundingBox], pr: &[BoundingBox]) -> IouMatrix {
    let gt = align_coordinates(gt);
    let pr = align_coordinates(pr);
    let values = gt
        .iter()
        .flat_map(|g| pr.iter().map(move |p| calculate_iou(g, p)))
        .collect();
    IouMatrix::from_row_major(gt.len(), pr.len(), values)
}
