/// Statistics tracking for mask filtering
///
/// This module provides counters collected while grouping mask records into
/// per-image targets and discarding images with unusable masks.

use serde::{Deserialize, Serialize};

/// Statistics collected during mask filtering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    /// Total number of mask rows read
    pub total_records: usize,

    /// Number of rows dropped because the mask was null
    pub dropped_null_records: usize,

    /// Number of distinct images after grouping
    pub grouped_images: usize,

    /// Number of images excluded because a mask failed to decode or validate
    pub rejected_images: usize,

    /// Number of surviving images with no vessel
    pub background_images: usize,
}

impl FilterStats {
    /// Create a new `FilterStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mask row
    pub fn add_record(&mut self) {
        self.total_records += 1;
    }

    /// Record a row dropped by the null-sample policy
    pub fn drop_null_record(&mut self) {
        self.dropped_null_records += 1;
    }

    /// Record an image excluded for an invalid mask
    pub fn reject_image(&mut self) {
        self.rejected_images += 1;
    }

    /// Record a surviving image without masks
    pub fn add_background_image(&mut self) {
        self.background_images += 1;
    }

    /// Set the number of grouped images
    pub fn set_grouped_images(&mut self, count: usize) {
        self.grouped_images = count;
    }

    /// Number of images that survived filtering
    pub fn kept_images(&self) -> usize {
        self.grouped_images.saturating_sub(self.rejected_images)
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "FilterStats {{ records: {}, null_dropped: {}, images: {}, rejected: {}, kept: {}, background: {} }}",
            self.total_records,
            self.dropped_null_records,
            self.grouped_images,
            self.rejected_images,
            self.kept_images(),
            self.background_images
        )
    }
}
