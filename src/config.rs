//! Training configuration.

use crate::error::{Result, VesselError};
use crate::targets::TestSize;
use crate::threshold::{default_iou_thresholds, validate_thresholds};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// All training parameters in one place.
///
/// Missing fields in a JSON file take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    pub seed: u64,
    /// Background plus vessel.
    pub num_classes: usize,
    /// Backbone layers left trainable; `-1` trains all layers.
    pub num_trainable_backbone_layers: i32,
    pub lr: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    /// Drop mask rows without vessels before grouping.
    pub no_null_samples: bool,
    pub test_size: TestSize,
    pub shuffle: bool,
    pub batch_size: usize,
    pub num_epochs: usize,
    /// Log progress every this many batches.
    pub print_every: usize,
    pub box_detections_per_img: usize,
    pub anchor_sizes: Vec<Vec<u32>>,
    /// IoU thresholds for the evaluation score.
    pub thresh_list: Vec<f64>,
    /// Cap on replacement draws when a sample has invalid boxes.
    pub max_resample_attempts: usize,
    pub mask_csv: PathBuf,
    pub train_image_dir: PathBuf,
    pub valid_image_dir: PathBuf,
    pub test_image_dir: PathBuf,
    pub checkpoint_path: PathBuf,
}

impl Default for TrainingParams {
    fn default() -> Self {
        let ship_dir = PathBuf::from("data/airbus-ship-detection");
        Self {
            seed: 0,
            num_classes: 2,
            num_trainable_backbone_layers: 3,
            lr: 0.001,
            momentum: 0.9,
            weight_decay: 0.0005,
            no_null_samples: true,
            test_size: TestSize::Fraction(0.01),
            shuffle: true,
            batch_size: 12,
            num_epochs: 30,
            print_every: 500,
            box_detections_per_img: 256,
            anchor_sizes: vec![vec![4], vec![8], vec![16], vec![32], vec![64]],
            thresh_list: default_iou_thresholds(),
            max_resample_attempts: 100,
            mask_csv: ship_dir.join("train_ship_segmentations_v2.csv"),
            train_image_dir: ship_dir.join("train_v2"),
            valid_image_dir: ship_dir.join("train_v2"),
            test_image_dir: ship_dir.join("test_v2"),
            checkpoint_path: PathBuf::from("vessel_detector_baseline_state_dict.bin"),
        }
    }
}

impl TrainingParams {
    /// Load parameters from a JSON file and validate them.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let params: TrainingParams = serde_json::from_reader(BufReader::new(file))?;
        params.validate()?;
        Ok(params)
    }

    /// Parse parameters from a JSON string and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: TrainingParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject settings that would break the training or evaluation loop.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(VesselError::InvalidConfig(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.print_every == 0 {
            return Err(VesselError::InvalidConfig(
                "print_every must be greater than 0".to_string(),
            ));
        }
        if self.max_resample_attempts == 0 {
            return Err(VesselError::InvalidConfig(
                "max_resample_attempts must be greater than 0".to_string(),
            ));
        }
        if self.num_classes < 2 {
            return Err(VesselError::InvalidConfig(format!(
                "num_classes must include background and vessel, got {}",
                self.num_classes
            )));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(VesselError::InvalidConfig(format!(
                "lr must be positive, got {}",
                self.lr
            )));
        }
        if let TestSize::Fraction(fraction) = self.test_size {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(VesselError::InvalidConfig(format!(
                    "test_size fraction must be in (0, 1), got {}",
                    fraction
                )));
            }
        }
        validate_thresholds(&self.thresh_list)
    }
}
