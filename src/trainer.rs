//! Training and evaluation loops around a [`DetectionModel`].

use crate::config::TrainingParams;
use crate::dataset::{
    DataLoader, DatasetMode, DatasetOptions, DirectoryImageStore, ImageStore, VesselDataset,
};
use crate::error::{Result, VesselError};
use crate::loader::load_masks_from_file;
use crate::metrics::score::{ScoreAccumulator, ScoreReport};
use crate::model::{describe_losses, total_loss, DetectionModel};
use crate::targets::{filter_masks, train_valid_split, FilteredMasks};
use crate::threshold::validate_thresholds;
use crate::types::MaskRecord;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

/// Loss bookkeeping for one epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    pub batches: usize,
    pub samples: usize,
    pub mean_loss: f64,
    pub seconds: f64,
}

/// Training and validation outcome of one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    pub training: EpochSummary,
    pub validation: ScoreReport,
}

/// Filtered masks plus the train/valid split of their image ids.
#[derive(Debug, Clone)]
pub struct PreparedSplits {
    pub filtered: FilteredMasks,
    pub train_ids: Vec<usize>,
    pub valid_ids: Vec<usize>,
}

/// Filter mask records and split the surviving images.
pub fn prepare_splits(records: &[MaskRecord], params: &TrainingParams) -> Result<PreparedSplits> {
    let filtered = filter_masks(records, params.no_null_samples);
    if filtered.is_empty() {
        return Err(VesselError::EmptyDataset(
            "no image survived mask filtering".to_string(),
        ));
    }
    let (train_ids, valid_ids) = train_valid_split(&filtered.ids(), params.test_size, params.seed)?;
    info!("Train Size: {}", train_ids.len());
    info!("Valid Size: {}", valid_ids.len());
    Ok(PreparedSplits {
        filtered,
        train_ids,
        valid_ids,
    })
}

/// Read the mask table named in `params` and split it.
pub fn prepare_splits_from_params(params: &TrainingParams) -> Result<PreparedSplits> {
    let records = load_masks_from_file(&params.mask_csv)?;
    prepare_splits(&records, params)
}

/// Build train and valid loaders over prepared splits.
///
/// The valid loader is seeded from `params.seed + 1` so the two passes draw
/// independent random streams.
pub fn build_loaders<S: ImageStore, V: ImageStore>(
    splits: &PreparedSplits,
    params: &TrainingParams,
    train_store: S,
    valid_store: V,
) -> Result<(DataLoader<S>, DataLoader<V>)> {
    let options = |mode| {
        DatasetOptions::for_mode(mode).with_max_resample_attempts(params.max_resample_attempts)
    };
    let train = VesselDataset::new(
        &splits.filtered,
        splits.train_ids.clone(),
        train_store,
        DatasetMode::Train,
        options(DatasetMode::Train),
    )?;
    let valid = VesselDataset::new(
        &splits.filtered,
        splits.valid_ids.clone(),
        valid_store,
        DatasetMode::Valid,
        options(DatasetMode::Valid),
    )?;
    Ok((
        DataLoader::new(train, params.batch_size, params.shuffle, params.seed)?,
        DataLoader::new(valid, params.batch_size, params.shuffle, params.seed.wrapping_add(1))?,
    ))
}

/// Read the mask table, split it and build loaders over the image
/// directories named in `params`.
pub fn build_loaders_from_params(
    params: &TrainingParams,
) -> Result<(
    PreparedSplits,
    DataLoader<DirectoryImageStore>,
    DataLoader<DirectoryImageStore>,
)> {
    params.validate()?;
    let splits = prepare_splits_from_params(params)?;
    let store = DirectoryImageStore::from_params(params);
    let (train, valid) = build_loaders(&splits, params, store.clone(), store)?;
    Ok((splits, train, valid))
}

/// Run one pass over the training loader.
///
/// Progress is logged every `print_every` batches with the mean loss since
/// the previous report and the number of samples seen so far.
///
/// # Errors
///
/// Returns `NonFiniteLoss` as soon as a batch reports a NaN or infinite
/// total loss; no further batch is processed.
pub fn train_one_epoch<M: DetectionModel, S: ImageStore>(
    model: &mut M,
    loader: &mut DataLoader<S>,
    epoch: usize,
    print_every: usize,
) -> Result<EpochSummary> {
    if print_every == 0 {
        return Err(VesselError::InvalidConfig(
            "print_every must be greater than 0".to_string(),
        ));
    }
    let start = Instant::now();
    let batch_size = loader.batch_size();
    let batches_per_epoch = loader.len();

    let mut running_loss = 0.0;
    let mut loss_sum = 0.0;
    let mut batches = 0;
    let mut samples = 0;

    for (i, batch) in loader.batches().enumerate() {
        let batch = batch?;
        let losses = model.train_step(&batch.images, &batch.targets)?;
        let loss = total_loss(&losses);
        if !loss.is_finite() {
            let components = describe_losses(&losses);
            error!("Loss is {}, stopping training", loss);
            error!("Loss components: {}", components);
            return Err(VesselError::NonFiniteLoss {
                total: loss,
                components,
            });
        }

        running_loss += loss;
        loss_sum += loss;
        batches += 1;
        samples += batch.len();

        if (i + 1) % print_every == 0 {
            info!(
                "[{}, {:5}] Running Loss: {:.3}",
                epoch + 1,
                i + 1,
                running_loss / print_every as f64
            );
            info!(
                "           Number of Samples Seen: {}",
                batch_size * ((i + 1) + epoch * batches_per_epoch)
            );
            running_loss = 0.0;
        }
    }

    Ok(EpochSummary {
        epoch,
        batches,
        samples,
        mean_loss: if batches == 0 { 0.0 } else { loss_sum / batches as f64 },
        seconds: start.elapsed().as_secs_f64(),
    })
}

/// Score the model's predictions on every batch of `loader`.
pub fn evaluate<M: DetectionModel, S: ImageStore>(
    model: &mut M,
    loader: &mut DataLoader<S>,
    thresholds: &[f64],
) -> Result<ScoreReport> {
    let mut accumulator = ScoreAccumulator::new(thresholds)?;
    for batch in loader.batches() {
        let batch = batch?;
        let predictions = model.predict(&batch.images)?;
        accumulator.add_batch(&batch.targets, &predictions)?;
    }
    accumulator.finish()
}

/// Log the evaluation summary of one epoch.
pub fn print_metrics(report: &ScoreReport, epoch: usize) {
    let thresholds: Vec<f64> = report.per_threshold.iter().map(|&(t, _)| t).collect();
    info!("[Epoch {:<2}] Evaluation results:", epoch + 1);
    info!(
        "    IoU (>) Thresholds: {:?} | mAP: {:<5.5}",
        thresholds, report.map
    );
}

/// Train for `params.num_epochs` epochs, validating and saving after each.
///
/// # Errors
///
/// Configuration errors are returned before the first batch. A non-finite
/// loss stops training immediately.
pub fn run_training<M: DetectionModel, S: ImageStore, V: ImageStore>(
    model: &mut M,
    train_loader: &mut DataLoader<S>,
    valid_loader: &mut DataLoader<V>,
    params: &TrainingParams,
) -> Result<Vec<EpochReport>> {
    params.validate()?;
    validate_thresholds(&params.thresh_list)?;
    if train_loader.is_empty() {
        return Err(VesselError::EmptyDataset("training split is empty".to_string()));
    }
    if valid_loader.is_empty() {
        return Err(VesselError::EmptyDataset("validation split is empty".to_string()));
    }

    info!("Starting Training...");
    let mut reports = Vec::with_capacity(params.num_epochs);
    for epoch in 0..params.num_epochs {
        let training = train_one_epoch(model, train_loader, epoch, params.print_every)?;
        info!("Epoch {} completed. Running validation...", epoch + 1);

        let validation = evaluate(model, valid_loader, &params.thresh_list)?;
        print_metrics(&validation, epoch);

        info!("Saving Model...");
        model.save(&params.checkpoint_path)?;
        info!("Model Saved to {}", params.checkpoint_path.display());

        reports.push(EpochReport {
            training,
            validation,
        });
    }
    info!("Finished Training.");
    Ok(reports)
}
