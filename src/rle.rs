//! Run-length encoded masks.
//!
//! Masks use the Kaggle text layout: whitespace separated `start length`
//! pairs, 1-indexed, over a column-major (Fortran order) flattening of a
//! `(height, width)` image. Pixel `(row, column)` lives at index
//! `row + height * column`.

use crate::error::{Result, VesselError};
use crate::types::{BoundingBox, Frame};

/// One run of foreground pixels, with a 0-indexed start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: u64,
    pub length: u64,
}

impl Run {
    /// One past the last pixel of the run.
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// Parse a run-length string into 0-indexed runs.
///
/// # Errors
///
/// Returns `MalformedRle` for non-integer tokens, an odd number of tokens,
/// a zero start index, a run whose end does not fit in `u64` or a string
/// without any pair.
pub fn parse_runs(rle: &str) -> Result<Vec<Run>> {
    let values = rle
        .split_whitespace()
        .map(|token| {
            token.parse::<u64>().map_err(|_| {
                VesselError::MalformedRle(format!("invalid token '{}'", token))
            })
        })
        .collect::<Result<Vec<u64>>>()?;

    if values.is_empty() {
        return Err(VesselError::MalformedRle("no runs in mask".to_string()));
    }
    if values.len() % 2 != 0 {
        return Err(VesselError::MalformedRle(format!(
            "expected start/length pairs, got {} values",
            values.len()
        )));
    }

    values
        .chunks_exact(2)
        .map(|pair| {
            let start = pair[0].checked_sub(1).ok_or_else(|| {
                VesselError::MalformedRle("start index is 1-based, got 0".to_string())
            })?;
            start.checked_add(pair[1]).ok_or_else(|| {
                VesselError::MalformedRle(format!(
                    "run {} {} ends past the largest pixel index",
                    pair[0], pair[1]
                ))
            })?;
            Ok(Run { start, length: pair[1] })
        })
        .collect()
}

/// Convert a run-length mask into its bounding box.
///
/// Rows come from `start % height` and columns from `start / height`. When a
/// run would spill past the bottom of its column the vertical extent falls
/// back to the whole frame height instead of being computed precisely.
/// A horizontal extent beyond `frame.width` is a hard error.
///
/// # Example
///
/// ```
/// use vessel_detect::rle::rle_to_bbox;
/// use vessel_detect::types::{BoundingBox, Frame};
///
/// // two runs of three pixels in columns 1 and 2
/// let bbox = rle_to_bbox("12 3 22 3", Frame::new(10, 10)).unwrap();
/// assert_eq!(bbox, BoundingBox::new(1.0, 1.0, 2.0, 4.0));
/// ```
pub fn rle_to_bbox(rle: &str, frame: Frame) -> Result<BoundingBox> {
    if frame.height == 0 || frame.width == 0 {
        return Err(VesselError::InvalidGeometry(format!(
            "degenerate frame {}x{}",
            frame.height, frame.width
        )));
    }
    let runs = parse_runs(rle)?;
    let height = u64::from(frame.height);

    let wraps = runs.iter().any(|r| r.start % height + r.length > height);
    let (y_min, y_max) = if wraps {
        (0, height)
    } else {
        let y_min = runs.iter().map(|r| r.start % height).min().unwrap_or(0);
        let y_max = runs
            .iter()
            .map(|r| r.start % height + r.length)
            .max()
            .unwrap_or(0);
        (y_min, y_max)
    };

    let x_min = runs.iter().map(|r| r.start / height).min().unwrap_or(0);
    let x_max = runs
        .iter()
        .map(|r| r.end() / height)
        .max()
        .unwrap_or(0);

    if x_max > u64::from(frame.width) {
        return Err(VesselError::InvalidGeometry(format!(
            "invalid RLE or image dimensions: x_max={} > width={}",
            x_max, frame.width
        )));
    }

    Ok(BoundingBox::new(
        x_min as f64,
        y_min as f64,
        x_max as f64,
        y_max as f64,
    ))
}

/// Encode a column-major binary mask as a run-length string.
///
/// Any non-zero byte is foreground. An all-background mask encodes to an
/// empty string.
pub fn encode_mask(mask: &[u8], frame: Frame) -> Result<String> {
    if mask.len() != frame.pixel_count() {
        return Err(VesselError::InvalidGeometry(format!(
            "mask has {} pixels, frame {}x{} needs {}",
            mask.len(),
            frame.height,
            frame.width,
            frame.pixel_count()
        )));
    }

    let mut pairs: Vec<String> = Vec::new();
    let mut run_start: Option<usize> = None;
    for (idx, &value) in mask.iter().enumerate() {
        match (value != 0, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                pairs.push(format!("{} {}", start + 1, idx - start));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        pairs.push(format!("{} {}", start + 1, mask.len() - start));
    }

    Ok(pairs.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_runs_converts_to_zero_based() {
        let runs = parse_runs("5 3 20 1").unwrap();
        assert_eq!(
            runs,
            vec![Run { start: 4, length: 3 }, Run { start: 19, length: 1 }]
        );
    }

    #[test]
    fn test_parse_runs_rejects_odd_tokens() {
        assert!(matches!(
            parse_runs("5 3 7"),
            Err(VesselError::MalformedRle(_))
        ));
    }

    #[test]
    fn test_parse_runs_rejects_zero_start() {
        assert!(matches!(parse_runs("0 3"), Err(VesselError::MalformedRle(_))));
    }

    #[test]
    fn test_parse_runs_rejects_garbage() {
        assert!(matches!(parse_runs("a b"), Err(VesselError::MalformedRle(_))));
        assert!(matches!(parse_runs(""), Err(VesselError::MalformedRle(_))));
    }

    #[test]
    fn test_single_column_run() {
        // start 4 in a 10-row frame: rows 4..7 of column 0
        let bbox = rle_to_bbox("5 3", Frame::new(10, 10)).unwrap();
        assert_eq!(bbox, BoundingBox::new(0.0, 4.0, 0.0, 7.0));
    }

    #[test]
    fn test_row_wrap_uses_full_height() {
        // start 8, length 4 crosses from column 0 into column 1
        let bbox = rle_to_bbox("9 4 35 2", Frame::new(10, 10)).unwrap();
        assert_eq!(bbox.y_min, 0.0);
        assert_eq!(bbox.y_max, 10.0);
        assert_eq!(bbox.x_min, 0.0);
        assert_eq!(bbox.x_max, 3.0);
    }

    #[test]
    fn test_column_overflow_is_error() {
        // last column is 9; a run ending past pixel 109 lands in column 11
        let result = rle_to_bbox("100 15", Frame::new(10, 10));
        assert!(matches!(result, Err(VesselError::InvalidGeometry(_))));
    }

    #[test]
    fn test_run_ending_on_last_pixel_is_not_overflow() {
        let bbox = rle_to_bbox("91 10", Frame::new(10, 10)).unwrap();
        assert_eq!(bbox.x_max, 10.0);
    }

    #[test]
    fn test_huge_run_is_malformed() {
        let result = rle_to_bbox("2 18446744073709551615", Frame::square(768));
        assert!(matches!(result, Err(VesselError::MalformedRle(_))));
        // the largest run that still fits is caught by the width check
        let result = rle_to_bbox("2 18446744073709551614", Frame::square(768));
        assert!(matches!(result, Err(VesselError::InvalidGeometry(_))));
    }

    #[test]
    fn test_encode_mask() {
        let frame = Frame::new(4, 2);
        // column 0: rows 1,2 set; column 1: row 3 set
        let mask = [0, 1, 1, 0, 0, 0, 0, 1];
        assert_eq!(encode_mask(&mask, frame).unwrap(), "2 2 8 1");
    }

    #[test]
    fn test_encode_empty_mask() {
        assert_eq!(encode_mask(&[0; 4], Frame::new(2, 2)).unwrap(), "");
    }

    #[test]
    fn test_encode_wrong_size() {
        assert!(encode_mask(&[0; 3], Frame::new(2, 2)).is_err());
    }
}
