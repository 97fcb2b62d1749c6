//! Image and box transforms applied before samples reach the detector.

use crate::error::{Result, VesselError};
use crate::types::{BoundingBox, Frame, Target};
use image::imageops::FilterType;
use image::DynamicImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// ImageNet channel means used for normalization.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations used for normalization.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resize an image and rescale its boxes to the new frame.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    pub input: Frame,
    pub output: Frame,
    pub filter: FilterType,
}

impl Resize {
    /// Bilinear resize from `input` to `output`.
    pub fn new(input: Frame, output: Frame) -> Self {
        Self {
            input,
            output,
            filter: FilterType::Triangle,
        }
    }

    /// Per-axis scale factors `(x, y)`.
    pub fn scale(&self) -> (f64, f64) {
        (
            f64::from(self.output.width) / f64::from(self.input.width),
            f64::from(self.output.height) / f64::from(self.input.height),
        )
    }

    /// Rescale boxes and round each coordinate to the nearest pixel.
    ///
    /// Halves round to even.
    ///
    /// # Example
    ///
    /// ```
    /// use vessel_detect::transform::Resize;
    /// use vessel_detect::types::{BoundingBox, Frame};
    ///
    /// let resize = Resize::new(Frame::square(768), Frame::square(299));
    /// let boxes = resize.resize_boxes(&[BoundingBox::new(100.0, 100.0, 200.0, 200.0)]);
    /// assert_eq!(boxes[0], BoundingBox::new(39.0, 39.0, 78.0, 78.0));
    /// ```
    pub fn resize_boxes(&self, boxes: &[BoundingBox]) -> Vec<BoundingBox> {
        let (x_scale, y_scale) = self.scale();
        boxes
            .iter()
            .map(|b| {
                BoundingBox::new(
                    (b.x_min * x_scale).round_ties_even(),
                    (b.y_min * y_scale).round_ties_even(),
                    (b.x_max * x_scale).round_ties_even(),
                    (b.y_max * y_scale).round_ties_even(),
                )
            })
            .collect()
    }

    /// Resize the image to the output frame.
    pub fn resize_image(&self, image: &DynamicImage) -> DynamicImage {
        image.resize_exact(self.output.width, self.output.height, self.filter)
    }

    /// Resize an image together with its target.
    pub fn apply(&self, image: &DynamicImage, target: &Target) -> (DynamicImage, Target) {
        let resized = self.resize_image(image);
        let target = Target {
            boxes: self.resize_boxes(&target.boxes),
            labels: target.labels.clone(),
        };
        (resized, target)
    }

    /// True when every box of `target` is valid in the output frame.
    pub fn boxes_valid(&self, target: &Target) -> bool {
        target.boxes.iter().all(|b| b.is_valid_in(self.output))
    }
}

/// Gaussian blur applied with a fixed probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomBlur {
    pub probability: f64,
    pub radius: f32,
}

impl RandomBlur {
    pub fn new(probability: f64, radius: f32) -> Self {
        Self { probability, radius }
    }

    /// Blur `image` if a draw from `rng` falls below the probability.
    pub fn apply<R: Rng + ?Sized>(&self, image: DynamicImage, rng: &mut R) -> DynamicImage {
        if rng.random::<f64>() < self.probability {
            image.blur(self.radius)
        } else {
            image
        }
    }
}

/// Normalized CHW float image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Value at `(channel, row, column)`.
    pub fn get(&self, channel: usize, row: usize, col: usize) -> f32 {
        self.data[(channel * self.height + row) * self.width + col]
    }
}

/// Convert to an RGB tensor in `[0, 1]`, then normalize each channel.
///
/// # Errors
///
/// Returns `InvalidConfig` for a zero standard deviation and `InvalidBox`
/// if the result holds a non-finite value.
pub fn to_normalized_tensor(
    image: &DynamicImage,
    mean: [f32; 3],
    std: [f32; 3],
) -> Result<ImageTensor> {
    if std.iter().any(|&s| s == 0.0) {
        return Err(VesselError::InvalidConfig(
            "normalization std must be non-zero".to_string(),
        ));
    }

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (width, height) = (width as usize, height as usize);
    let mut data = vec![0.0f32; 3 * width * height];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for channel in 0..3 {
            let value = f32::from(pixel[channel]) / 255.0;
            let idx = (channel * height + y as usize) * width + x as usize;
            data[idx] = (value - mean[channel]) / std[channel];
        }
    }

    if data.iter().any(|v| !v.is_finite()) {
        return Err(VesselError::InvalidBox(
            "normalized image holds non-finite values".to_string(),
        ));
    }

    Ok(ImageTensor {
        channels: 3,
        height,
        width,
        data,
    })
}
