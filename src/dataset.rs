//! Vessel dataset and batch loader.
//!
//! A dataset owns the masks of a split and turns an index into a resized,
//! blurred and normalized image with its target. Samples whose boxes become
//! invalid after resizing are swapped for a randomly drawn one; the number of
//! draws is capped.

use crate::config::TrainingParams;
use crate::error::{Result, VesselError};
use crate::targets::{make_target, FilteredMasks};
use crate::transform::{
    to_normalized_tensor, ImageTensor, RandomBlur, Resize, IMAGENET_MEAN, IMAGENET_STD,
};
use crate::types::{Frame, Target, MODEL_FRAME, ORIGINAL_FRAME};
use image::DynamicImage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Which split a dataset serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetMode {
    Train,
    Valid,
    Test,
}

/// Source of raw images.
pub trait ImageStore {
    /// Read the image stored under `file_name` for the given split.
    fn load(&self, file_name: &str, mode: DatasetMode) -> Result<DynamicImage>;
}

/// Images read from one directory per split.
#[derive(Debug, Clone)]
pub struct DirectoryImageStore {
    pub train_dir: PathBuf,
    pub valid_dir: PathBuf,
    pub test_dir: PathBuf,
}

impl DirectoryImageStore {
    /// Use the same directory for every split.
    pub fn shared<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            train_dir: dir.clone(),
            valid_dir: dir.clone(),
            test_dir: dir,
        }
    }

    /// Use the image directories named in `params`.
    pub fn from_params(params: &TrainingParams) -> Self {
        Self {
            train_dir: params.train_image_dir.clone(),
            valid_dir: params.valid_image_dir.clone(),
            test_dir: params.test_image_dir.clone(),
        }
    }

    fn dir(&self, mode: DatasetMode) -> &Path {
        match mode {
            DatasetMode::Train => &self.train_dir,
            DatasetMode::Valid => &self.valid_dir,
            DatasetMode::Test => &self.test_dir,
        }
    }
}

impl ImageStore for DirectoryImageStore {
    fn load(&self, file_name: &str, mode: DatasetMode) -> Result<DynamicImage> {
        Ok(image::open(self.dir(mode).join(file_name))?)
    }
}

/// Per-split preprocessing settings.
#[derive(Debug, Clone, Copy)]
pub struct DatasetOptions {
    pub input_frame: Frame,
    pub output_frame: Frame,
    pub blur: RandomBlur,
    pub max_resample_attempts: usize,
}

impl DatasetOptions {
    /// Defaults per split: train blurs 95% of images, valid blurs all, test none.
    pub fn for_mode(mode: DatasetMode) -> Self {
        let probability = match mode {
            DatasetMode::Train => 0.95,
            DatasetMode::Valid => 1.0,
            DatasetMode::Test => 0.0,
        };
        Self {
            input_frame: ORIGINAL_FRAME,
            output_frame: MODEL_FRAME,
            blur: RandomBlur::new(probability, 2.0),
            max_resample_attempts: 100,
        }
    }

    pub fn with_max_resample_attempts(mut self, attempts: usize) -> Self {
        self.max_resample_attempts = attempts;
        self
    }
}

/// One preprocessed image with its rescaled target.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub image_id: usize,
    pub image: ImageTensor,
    pub target: Target,
}

/// Images and masks of one split.
pub struct VesselDataset<S> {
    image_ids: Vec<usize>,
    image_names: BTreeMap<usize, String>,
    image_masks: BTreeMap<usize, Vec<Option<String>>>,
    store: S,
    mode: DatasetMode,
    options: DatasetOptions,
}

impl<S: ImageStore> VesselDataset<S> {
    /// Build a dataset over `image_ids`, taking names and masks from `filtered`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataset` if an id is unknown to `filtered`.
    pub fn new(
        filtered: &FilteredMasks,
        image_ids: Vec<usize>,
        store: S,
        mode: DatasetMode,
        options: DatasetOptions,
    ) -> Result<Self> {
        let mut image_names = BTreeMap::new();
        let mut image_masks = BTreeMap::new();
        for &id in &image_ids {
            let name = filtered.image_names.get(&id).ok_or_else(|| {
                VesselError::EmptyDataset(format!("image index {} was filtered out", id))
            })?;
            image_names.insert(id, name.clone());
            image_masks.insert(id, filtered.image_masks.get(&id).cloned().unwrap_or_default());
        }
        Ok(Self {
            image_ids,
            image_names,
            image_masks,
            store,
            mode,
            options,
        })
    }

    pub fn len(&self) -> usize {
        self.image_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_ids.is_empty()
    }

    pub fn mode(&self) -> DatasetMode {
        self.mode
    }

    /// Image index stored at `position`.
    pub fn image_id(&self, position: usize) -> Option<usize> {
        self.image_ids.get(position).copied()
    }

    /// Load the labelled sample at `position`.
    ///
    /// When the rescaled boxes are invalid another position is drawn from
    /// `rng` and tried instead, up to `max_resample_attempts` samples in total.
    ///
    /// # Errors
    ///
    /// Returns `NoValidSample` when every attempt was unusable, `InvalidConfig`
    /// in test mode, and image store errors as they occur.
    pub fn get<R: Rng + ?Sized>(&self, position: usize, rng: &mut R) -> Result<LabeledSample> {
        if self.mode == DatasetMode::Test {
            return Err(VesselError::InvalidConfig(
                "test split has no targets; use get_image".to_string(),
            ));
        }
        if position >= self.len() {
            return Err(VesselError::EmptyDataset(format!(
                "position {} out of {} samples",
                position,
                self.len()
            )));
        }

        let mut position = position;
        for _ in 0..self.options.max_resample_attempts {
            if let Some(sample) = self.try_labeled(self.image_ids[position], rng)? {
                return Ok(sample);
            }
            position = rng.random_range(0..self.len());
        }

        Err(VesselError::NoValidSample {
            attempts: self.options.max_resample_attempts,
        })
    }

    /// Load the resized, normalized image at `position` without a target.
    pub fn get_image(&self, position: usize) -> Result<ImageTensor> {
        let image_id = self.image_id(position).ok_or_else(|| {
            VesselError::EmptyDataset(format!("position {} out of {} samples", position, self.len()))
        })?;
        let image = self.load(image_id)?;
        let resize = Resize::new(self.options.input_frame, self.options.output_frame);
        to_normalized_tensor(&resize.resize_image(&image), IMAGENET_MEAN, IMAGENET_STD)
    }

    fn load(&self, image_id: usize) -> Result<DynamicImage> {
        let name = self.image_names.get(&image_id).ok_or_else(|| {
            VesselError::EmptyDataset(format!("no file name for image {}", image_id))
        })?;
        self.store.load(name, self.mode)
    }

    /// `Ok(None)` marks a sample whose boxes cannot be used.
    fn try_labeled<R: Rng + ?Sized>(
        &self,
        image_id: usize,
        rng: &mut R,
    ) -> Result<Option<LabeledSample>> {
        let masks = self
            .image_masks
            .get(&image_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let target = match make_target(masks, self.options.input_frame) {
            Ok(target) => target,
            Err(VesselError::MalformedRle(_))
            | Err(VesselError::InvalidGeometry(_))
            | Err(VesselError::InvalidBox(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        // boxes are checked before the image is read
        let resize = Resize::new(self.options.input_frame, self.options.output_frame);
        let target = Target {
            boxes: resize.resize_boxes(&target.boxes),
            labels: target.labels,
        };
        if !resize.boxes_valid(&target) {
            return Ok(None);
        }

        let image = resize.resize_image(&self.load(image_id)?);
        let image = self.options.blur.apply(image, rng);
        let image = to_normalized_tensor(&image, IMAGENET_MEAN, IMAGENET_STD)?;
        Ok(Some(LabeledSample {
            image_id,
            image,
            target,
        }))
    }
}

/// A batch of labelled samples.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub image_ids: Vec<usize>,
    pub images: Vec<ImageTensor>,
    pub targets: Vec<Target>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn collate(samples: Vec<LabeledSample>) -> Self {
        let mut batch = Batch::default();
        for sample in samples {
            batch.image_ids.push(sample.image_id);
            batch.images.push(sample.image);
            batch.targets.push(sample.target);
        }
        batch
    }
}

/// Splits a dataset into batches, optionally shuffled with a seeded RNG.
pub struct DataLoader<S> {
    dataset: VesselDataset<S>,
    batch_size: usize,
    shuffle: bool,
    rng: StdRng,
}

impl<S: ImageStore> DataLoader<S> {
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `batch_size` is zero.
    pub fn new(dataset: VesselDataset<S>, batch_size: usize, shuffle: bool, seed: u64) -> Result<Self> {
        if batch_size == 0 {
            return Err(VesselError::InvalidConfig(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dataset,
            batch_size,
            shuffle,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn dataset(&self) -> &VesselDataset<S> {
        &self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches per pass; the last one may be short.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Iterate over one pass of the dataset.
    pub fn batches(&mut self) -> BatchIter<'_, S> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        BatchIter {
            dataset: &self.dataset,
            rng: &mut self.rng,
            order,
            cursor: 0,
            batch_size: self.batch_size,
        }
    }
}

/// Iterator over the batches of one pass.
pub struct BatchIter<'a, S> {
    dataset: &'a VesselDataset<S>,
    rng: &'a mut StdRng,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
}

impl<S: ImageStore> Iterator for BatchIter<'_, S> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let positions = self.order[self.cursor..end].to_vec();
        self.cursor = end;

        let samples = positions
            .into_iter()
            .map(|position| self.dataset.get(position, &mut *self.rng))
            .collect::<Result<Vec<_>>>();
        Some(samples.map(Batch::collate))
    }
}
