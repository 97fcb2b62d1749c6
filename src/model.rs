//! Boundary to the trainable detector.
//!
//! The detector (a Faster R-CNN style network with a pretrained backbone) is
//! not implemented here. Anything that can take a training step on a batch,
//! predict boxes and persist its parameters can be driven by the trainer.

use crate::error::Result;
use crate::transform::ImageTensor;
use crate::types::{Prediction, Target};
use std::collections::BTreeMap;
use std::path::Path;

/// Named loss components returned by a training step.
pub type LossMap = BTreeMap<String, f64>;

/// Sum of all loss components.
pub fn total_loss(losses: &LossMap) -> f64 {
    losses.values().sum()
}

/// Render loss components as `name=value` pairs.
pub fn describe_losses(losses: &LossMap) -> String {
    losses
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A detector that can be trained, queried and saved.
pub trait DetectionModel {
    /// Run forward and backward passes on one batch and update parameters.
    ///
    /// Returns the loss components of the batch.
    fn train_step(&mut self, images: &[ImageTensor], targets: &[Target]) -> Result<LossMap>;

    /// Predict boxes and scores for each image, in input order.
    fn predict(&mut self, images: &[ImageTensor]) -> Result<Vec<Prediction>>;

    /// Persist the trainable parameters to `path`.
    fn save(&self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_and_describe() {
        let mut losses = LossMap::new();
        losses.insert("loss_classifier".to_string(), 0.5);
        losses.insert("loss_box_reg".to_string(), 0.25);
        assert!((total_loss(&losses) - 0.75).abs() < 1e-12);
        assert_eq!(
            describe_losses(&losses),
            "loss_box_reg=0.25, loss_classifier=0.5"
        );
    }
}
