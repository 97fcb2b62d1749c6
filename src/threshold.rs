//! IoU threshold utilities.

use crate::error::{Result, VesselError};

/// Generate a range of threshold values for evaluation.
///
/// Values are evenly spaced, both ends included, and rounded to 8 decimals
/// so that `0.55` compares equal to the literal.
///
/// # Arguments
///
/// * `start` - Starting threshold value (inclusive)
/// * `end` - Ending threshold value (inclusive)
/// * `steps` - Number of threshold values to generate
///
/// # Errors
///
/// Returns an error if `steps == 0`, `start > end` or a bound lies outside
/// `[0.0, 1.0]`.
///
/// # Example
///
/// ```
/// use vessel_detect::threshold::generate_threshold_range;
///
/// let thresholds = generate_threshold_range(0.5, 0.75, 6).unwrap();
/// assert_eq!(thresholds, vec![0.5, 0.55, 0.6, 0.65, 0.7, 0.75]);
/// ```
pub fn generate_threshold_range(start: f64, end: f64, steps: usize) -> Result<Vec<f64>> {
    if steps == 0 {
        return Err(VesselError::InvalidThreshold(
            "Number of steps must be greater than 0".to_string(),
        ));
    }

    validate_threshold(start)?;
    validate_threshold(end)?;

    if start > end {
        return Err(VesselError::InvalidThreshold(format!(
            "Start threshold ({}) must be <= end threshold ({})",
            start, end
        )));
    }

    if steps == 1 {
        return Ok(vec![round8(start)]);
    }

    let step_size = (end - start) / (steps - 1) as f64;
    Ok((0..steps)
        .map(|i| round8(start + step_size * i as f64))
        .collect())
}

/// IoU thresholds used by the evaluation pass: 0.5 to 0.75 in steps of 0.05.
pub fn default_iou_thresholds() -> Vec<f64> {
    (0..6).map(|i| round8(0.5 + 0.05 * i as f64)).collect()
}

/// Validate a threshold list: non-empty, every value in `[0.0, 1.0]`.
pub fn validate_thresholds(thresholds: &[f64]) -> Result<()> {
    if thresholds.is_empty() {
        return Err(VesselError::InvalidThreshold(
            "At least one IoU threshold is required".to_string(),
        ));
    }
    thresholds.iter().try_for_each(|&t| validate_threshold(t))
}

/// Validate that a threshold is in the valid range [0.0, 1.0].
fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(VesselError::InvalidThreshold(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(())
}

fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}
