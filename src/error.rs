//! Error types for the vessel-detect library.

use thiserror::Error;

/// Result type for vessel-detect operations.
pub type Result<T> = std::result::Result<T, VesselError>;

/// Error types that can occur while preparing labels, training or scoring.
#[derive(Error, Debug)]
pub enum VesselError {
    /// Run-length string could not be parsed into `(start, length)` pairs.
    #[error("Malformed RLE: {0}")]
    MalformedRle(String),

    /// Decoded mask does not fit the declared image shape.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Bounding box failed the in-frame / min<max check.
    #[error("Invalid bounding box: {0}")]
    InvalidBox(String),

    /// The model reported a loss that is NaN or infinite.
    #[error("Non-finite loss {total} (components: {components})")]
    NonFiniteLoss { total: f64, components: String },

    /// Every resampling attempt produced an unusable sample.
    #[error("No valid sample after {attempts} attempts")]
    NoValidSample { attempts: usize },

    /// Invalid IoU threshold or threshold list.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Invalid training configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Empty dataset provided.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Required column missing from the mask table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Mask table has an unexpected layout or dtype.
    #[error("Invalid DataFrame: {0}")]
    InvalidDataFrame(String),

    /// Failure reported by the detection model.
    #[error("Model error: {0}")]
    Model(String),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error raised by Polars while reading the mask table.
    #[error("Polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),

    /// Error while decoding or encoding an image.
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}
