//! # vessel-detect
//!
//! Label preparation and scoring for a satellite vessel detector.
//!
//! Ground truth for the detector comes from run-length encoded ship masks.
//! This library provides:
//! - **RLE decoding** of column-major masks into bounding boxes
//! - **Mask filtering** that drops images with degenerate or out-of-frame boxes
//! - **Target assembly** and a seeded train/valid split
//! - **Resizing** of images and boxes from the 768×768 source frame to the
//!   299×299 model frame, with bounded resampling of unusable samples
//! - **Greedy IoU matching** of predictions against ground truth
//! - **Detection score**: `TP / (TP + FP + FN)` per image, averaged over
//!   images and over a list of IoU thresholds
//! - A **training loop** around any model implementing [`DetectionModel`]
//!
//! ## Quick Start
//!
//! ```rust
//! use vessel_detect::loader::load_masks_from_str;
//! use vessel_detect::targets::filter_masks;
//! use vessel_detect::metrics::score::calculate_map;
//! use vessel_detect::types::ORIGINAL_FRAME;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let csv = "ImageId,EncodedPixels\nship.jpg,769 3 1537 3\nsea.jpg,\n";
//! let records = load_masks_from_str(csv)?;
//! let filtered = filter_masks(&records, true);
//! let target = filtered.target(filtered.ids()[0], ORIGINAL_FRAME)?;
//!
//! // a perfect prediction scores 1.0
//! let score = calculate_map(&target.boxes, &target.boxes, &[0.9], 0.5)?;
//! assert_eq!(score, 1.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Mask format
//!
//! The mask table is a CSV file with one row per ship:
//!
//! ```text
//! ImageId,EncodedPixels
//! 00003e153.jpg,
//! 000155de5.jpg,264661 17 265429 33 266197 33
//! ```
//!
//! `EncodedPixels` holds 1-indexed `start length` pairs over the image
//! flattened column by column. An empty cell marks an image without ships.

pub mod error;
pub mod types;
pub mod rle;
pub mod loader;
pub mod stats;
pub mod targets;
pub mod transform;
pub mod dataset;
pub mod threshold;
pub mod metrics;
pub mod matching;
pub mod config;
pub mod model;
pub mod trainer;

// Re-export commonly used types and functions
pub use error::{Result, VesselError};
pub use types::{
    BoundingBox, Frame, MaskRecord, Prediction, Target, FOREGROUND_CLASS, MODEL_FRAME,
    ORIGINAL_FRAME,
};
pub use rle::{encode_mask, rle_to_bbox};
pub use loader::{load_masks_from_file, load_masks_from_str};
pub use targets::{filter_masks, make_target, train_valid_split, FilteredMasks, TestSize};
pub use matching::{get_mappings, match_predictions, AssignmentMatrix};
pub use metrics::score::{calculate_map, score_dataset, ScoreReport};
pub use threshold::{default_iou_thresholds, generate_threshold_range};
pub use config::TrainingParams;
pub use model::{DetectionModel, LossMap};
pub use trainer::{evaluate, run_training, train_one_epoch};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_compiles() {
        // Basic smoke test to ensure the library compiles
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.is_valid_in(ORIGINAL_FRAME));
    }
}
