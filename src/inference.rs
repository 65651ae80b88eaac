//! Detection backend abstraction

use crate::{detection::DetectionResult, error::Result};
use image::DynamicImage;

/// Trait for detection/segmentation models
///
/// Implementations run a loaded model on one image and return the instances
/// for the requested class. Detections are expected to come back already
/// filtered by class and confidence; the mask extractor re-filters
/// defensively but backends should not rely on that.
///
/// Implementations must be shareable across threads: after the first load the
/// handle is used concurrently read-only, so any interior session state needs
/// its own synchronization.
pub trait DetectionModel: Send + Sync {
    /// Run detection on the input image
    ///
    /// # Errors
    /// - Model inference failures
    /// - Tensor conversion or output decoding errors
    fn detect(
        &self,
        image: &DynamicImage,
        class_id: u32,
        confidence_threshold: f32,
    ) -> Result<DetectionResult>;
}
