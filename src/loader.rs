//! CSV loading utilities for the ship segmentation mask table.

use crate::error::{Result, VesselError};
use crate::types::MaskRecord;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Column holding the image file name.
pub const IMAGE_ID_COLUMN: &str = "ImageId";

/// Column holding the run-length encoded mask.
pub const ENCODED_PIXELS_COLUMN: &str = "EncodedPixels";

/// Load mask records from a CSV file.
///
/// # Arguments
///
/// * `path` - Path to a CSV file with `ImageId` and `EncodedPixels` columns
///
/// # Returns
///
/// Returns one `MaskRecord` per row, in file order. Empty `EncodedPixels`
/// cells become `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or lacks a required column.
///
/// # Example
///
/// ```no_run
/// use vessel_detect::loader::load_masks_from_file;
///
/// let masks = load_masks_from_file("train_ship_segmentations_v2.csv").unwrap();
/// println!("Loaded {} mask rows", masks.len());
/// ```
pub fn load_masks_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<MaskRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    records_from_frame(&df)
}

/// Load mask records from CSV text.
///
/// # Example
///
/// ```
/// use vessel_detect::loader::load_masks_from_str;
///
/// let csv = "ImageId,EncodedPixels\na.jpg,1 3\nb.jpg,\n";
/// let masks = load_masks_from_str(csv).unwrap();
/// assert_eq!(masks.len(), 2);
/// assert!(masks[1].encoded_pixels.is_none());
/// ```
pub fn load_masks_from_str(csv: &str) -> Result<Vec<MaskRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(csv.as_bytes().to_vec()))
        .finish()?;
    records_from_frame(&df)
}

/// Validate that a DataFrame contains all required columns.
pub fn validate_columns(df: &DataFrame, required_columns: &[&str]) -> Result<()> {
    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for col in required_columns {
        if !column_names.iter().any(|c| c == col) {
            return Err(VesselError::MissingColumn(col.to_string()));
        }
    }

    Ok(())
}

/// Convert a mask table into records.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<MaskRecord>> {
    validate_columns(df, &[IMAGE_ID_COLUMN, ENCODED_PIXELS_COLUMN])?;

    let ids = df.column(IMAGE_ID_COLUMN)?.cast(&DataType::String)?;
    let masks = df.column(ENCODED_PIXELS_COLUMN)?.cast(&DataType::String)?;
    let ids = ids.str()?;
    let masks = masks.str()?;

    ids.into_iter()
        .zip(masks.into_iter())
        .enumerate()
        .map(|(row, (image_id, mask))| {
            let image_id = image_id.ok_or_else(|| {
                VesselError::InvalidDataFrame(format!("row {} has no {}", row, IMAGE_ID_COLUMN))
            })?;
            let mask = mask.filter(|m| !m.trim().is_empty());
            Ok(MaskRecord::new(image_id, mask))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_str() {
        let csv = "ImageId,EncodedPixels\n\
                   00003e153.jpg,\n\
                   000155de5.jpg,264661 17 265429 33\n\
                   000155de5.jpg,1 2\n";
        let masks = load_masks_from_str(csv).unwrap();
        assert_eq!(masks.len(), 3);
        assert_eq!(masks[0].image_id, "00003e153.jpg");
        assert!(masks[0].is_null());
        assert_eq!(masks[1].encoded_pixels.as_deref(), Some("264661 17 265429 33"));
    }

    #[test]
    fn test_missing_column() {
        let csv = "ImageId,Other\na.jpg,1\n";
        match load_masks_from_str(csv) {
            Err(VesselError::MissingColumn(col)) => assert_eq!(col, ENCODED_PIXELS_COLUMN),
            other => panic!("Expected MissingColumn error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_columns_success() {
        let df = df! {
            "ImageId" => &["a.jpg", "b.jpg"],
            "EncodedPixels" => &["1 2", "3 4"],
        }
        .unwrap();

        assert!(validate_columns(&df, &[IMAGE_ID_COLUMN, ENCODED_PIXELS_COLUMN]).is_ok());
        assert_eq!(records_from_frame(&df).unwrap().len(), 2);
    }
}
