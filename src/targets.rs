//! Mask filtering and per-image target assembly.

use crate::error::{Result, VesselError};
use crate::rle::rle_to_bbox;
use crate::stats::FilterStats;
use crate::types::{BoundingBox, Frame, MaskRecord, Target, ORIGINAL_FRAME};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Masks grouped per image, keyed by a dense image index.
///
/// Indices are assigned before invalid images are removed, so the surviving
/// keys may have gaps.
#[derive(Debug, Clone, Default)]
pub struct FilteredMasks {
    pub image_names: BTreeMap<usize, String>,
    pub image_masks: BTreeMap<usize, Vec<Option<String>>>,
    pub stats: FilterStats,
}

impl FilteredMasks {
    pub fn len(&self) -> usize {
        self.image_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_names.is_empty()
    }

    /// Surviving image indices in ascending order.
    pub fn ids(&self) -> Vec<usize> {
        self.image_names.keys().copied().collect()
    }

    /// Build the target for one surviving image.
    pub fn target(&self, idx: usize, frame: Frame) -> Result<Target> {
        let masks = self.image_masks.get(&idx).ok_or_else(|| {
            VesselError::EmptyDataset(format!("no image with index {}", idx))
        })?;
        make_target(masks, frame)
    }
}

/// Decode a mask and check its box against `frame`.
///
/// # Errors
///
/// Propagates decoder errors and returns `InvalidBox` when the box is
/// degenerate or outside the frame.
pub fn validate_mask(rle: &str, frame: Frame) -> Result<BoundingBox> {
    let bbox = rle_to_bbox(rle, frame)?;
    if !bbox.is_valid_in(frame) {
        return Err(VesselError::InvalidBox(format!(
            "{:?} outside {}x{} frame",
            bbox.to_xyxy(),
            frame.height,
            frame.width
        )));
    }
    Ok(bbox)
}

/// True when the mask decodes to a valid box inside `frame`.
pub fn is_valid(rle: &str, frame: Frame) -> bool {
    validate_mask(rle, frame).is_ok()
}

/// True when the box is strictly ordered and inside `frame`.
pub fn is_valid_box(bbox: &BoundingBox, frame: Frame) -> bool {
    bbox.is_valid_in(frame)
}

/// Group mask records by image and drop images with unusable masks.
///
/// Masks are checked against the 768×768 source frame.
pub fn filter_masks(records: &[MaskRecord], no_null_samples: bool) -> FilteredMasks {
    filter_masks_in(records, no_null_samples, ORIGINAL_FRAME)
}

/// Group mask records by image and drop images with unusable masks.
///
/// # Arguments
///
/// * `records` - Mask table rows
/// * `no_null_samples` - Drop rows without a mask before grouping
/// * `frame` - Pixel layout the masks were encoded against
///
/// # Returns
///
/// Returns the index → file name and index → masks mappings. Indices follow
/// ascending image id order. An image is excluded from both mappings as soon
/// as one of its masks fails to decode or produces an invalid box.
pub fn filter_masks_in(records: &[MaskRecord], no_null_samples: bool, frame: Frame) -> FilteredMasks {
    let mut stats = FilterStats::new();
    let mut groups: BTreeMap<&str, Vec<Option<String>>> = BTreeMap::new();

    for record in records {
        stats.add_record();
        if no_null_samples && record.is_null() {
            stats.drop_null_record();
            continue;
        }
        let mask = if record.is_null() {
            None
        } else {
            record.encoded_pixels.clone()
        };
        groups.entry(record.image_id.as_str()).or_default().push(mask);
    }
    stats.set_grouped_images(groups.len());

    let mut image_names = BTreeMap::new();
    let mut image_masks = BTreeMap::new();

    for (idx, (image_id, masks)) in groups.into_iter().enumerate() {
        let all_valid = masks
            .iter()
            .flatten()
            .all(|rle| is_valid(rle, frame));
        if !all_valid {
            stats.reject_image();
            continue;
        }
        if masks.iter().all(Option::is_none) {
            stats.add_background_image();
        }
        image_names.insert(idx, image_id.to_string());
        image_masks.insert(idx, masks);
    }

    debug!("{}", stats.summary_string());

    FilteredMasks {
        image_names,
        image_masks,
        stats,
    }
}

/// Build the target for one image from its masks.
///
/// Null masks are skipped. An image without masks yields `Target::empty()`.
pub fn make_target(masks: &[Option<String>], frame: Frame) -> Result<Target> {
    let boxes = masks
        .iter()
        .flatten()
        .map(|rle| rle_to_bbox(rle, frame))
        .collect::<Result<Vec<_>>>()?;

    if boxes.is_empty() {
        return Ok(Target::empty());
    }

    if boxes.iter().flat_map(|b| b.to_xyxy()).any(|v| !v.is_finite()) {
        return Err(VesselError::InvalidBox("non-finite coordinate".to_string()));
    }

    Ok(Target::from_boxes(boxes))
}

/// Size of the validation split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestSize {
    /// Absolute number of validation images.
    Count(usize),
    /// Fraction of images, rounded up.
    Fraction(f64),
}

impl TestSize {
    /// Number of validation images out of `total`.
    pub fn valid_count(&self, total: usize) -> Result<usize> {
        let count = match *self {
            TestSize::Count(count) => count,
            TestSize::Fraction(fraction) => {
                if !(fraction > 0.0 && fraction < 1.0) {
                    return Err(VesselError::InvalidConfig(format!(
                        "test_size fraction must be in (0, 1), got {}",
                        fraction
                    )));
                }
                (fraction * total as f64).ceil() as usize
            }
        };
        if count == 0 || count >= total {
            return Err(VesselError::InvalidConfig(format!(
                "test_size {:?} leaves an empty split for {} images",
                self, total
            )));
        }
        Ok(count)
    }
}

/// Shuffle image ids with a fixed seed and split them into train and valid.
///
/// Returns `(train_ids, valid_ids)`.
pub fn train_valid_split(
    ids: &[usize],
    test_size: TestSize,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let valid_count = test_size.valid_count(ids.len())?;

    let mut shuffled = ids.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let train_ids = shuffled.split_off(valid_count);
    Ok((train_ids, shuffled))
}
