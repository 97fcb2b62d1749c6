//! Core data types for masks, boxes, targets and predictions.

use serde::{Deserialize, Serialize};

/// Class label shared by every vessel box.
pub const FOREGROUND_CLASS: i64 = 1;

/// Pixel frame of the source images.
pub const ORIGINAL_FRAME: Frame = Frame::square(768);

/// Pixel frame expected by the detector.
pub const MODEL_FRAME: Frame = Frame::square(299);

/// Pixel layout of an image, `(height, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    pub height: u32,
    pub width: u32,
}

impl Frame {
    /// Create a new frame.
    pub const fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    /// Create a square frame.
    pub const fn square(side: u32) -> Self {
        Self { height: side, width: side }
    }

    /// Number of pixels in the frame.
    pub fn pixel_count(&self) -> usize {
        self.height as usize * self.width as usize
    }
}

/// Axis-aligned bounding box in `(x_min, y_min, x_max, y_max)` form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    /// Build a box from an `[x1, y1, x2, y2]` array.
    pub fn from_xyxy(coords: [f64; 4]) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    /// Coordinates as an `[x1, y1, x2, y2]` array.
    pub fn to_xyxy(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Area of the box; negative extents count as zero.
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Swap corners so that the first point is the min-corner.
    pub fn aligned(&self) -> Self {
        Self {
            x_min: self.x_min.min(self.x_max),
            y_min: self.y_min.min(self.y_max),
            x_max: self.x_min.max(self.x_max),
            y_max: self.y_min.max(self.y_max),
        }
    }

    /// Check that the box is strictly ordered and lies inside `frame`.
    ///
    /// The max-corner must be strictly below the frame size, so a box touching
    /// `x == width` or `y == height` is rejected.
    pub fn is_valid_in(&self, frame: Frame) -> bool {
        let width = f64::from(frame.width);
        let height = f64::from(frame.height);
        self.x_min >= 0.0
            && self.x_max < width
            && self.x_min < self.x_max
            && self.y_min >= 0.0
            && self.y_max < height
            && self.y_min < self.y_max
    }
}

/// One row of the mask table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRecord {
    pub image_id: String,
    /// `None` marks an image without vessels.
    pub encoded_pixels: Option<String>,
}

impl MaskRecord {
    pub fn new(image_id: impl Into<String>, encoded_pixels: Option<&str>) -> Self {
        Self {
            image_id: image_id.into(),
            encoded_pixels: encoded_pixels.map(str::to_string),
        }
    }

    /// True when the record carries no mask.
    pub fn is_null(&self) -> bool {
        self.encoded_pixels
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
    }
}

/// Ground-truth boxes and labels for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub boxes: Vec<BoundingBox>,
    pub labels: Vec<i64>,
}

impl Target {
    /// Target for a background-only image.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a target labelling every box as a vessel.
    pub fn from_boxes(boxes: Vec<BoundingBox>) -> Self {
        let labels = vec![FOREGROUND_CLASS; boxes.len()];
        Self { boxes, labels }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Detector output for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub boxes: Vec<BoundingBox>,
    /// Confidence per box, parallel to `boxes`.
    pub scores: Vec<f64>,
}

impl Prediction {
    pub fn new(boxes: Vec<BoundingBox>, scores: Vec<f64>) -> Self {
        Self { boxes, scores }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
