//! Detection result types produced by the upstream segmentation model
//!
//! The cutout pipeline does not run detection itself; it consumes a
//! `DetectionResult` returned by a [`crate::inference::DetectionModel`] and
//! reduces it to a single binary mask.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in source-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box area in pixels; zero for degenerate boxes
    #[must_use]
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection-over-union with another box
    #[must_use]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Per-instance soft segmentation mask
///
/// Values are membership probabilities in `[0, 1]`. The resolution may differ
/// from the source image; the extractor resizes with nearest-neighbor before
/// thresholding.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceMask {
    /// Probability buffer, row-major
    pub data: Vec<f32>,
    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl InstanceMask {
    /// Create a new instance mask, validating buffer length against dimensions
    pub fn new(data: Vec<f32>, dimensions: (u32, u32)) -> crate::error::Result<Self> {
        let expected = dimensions.0 as usize * dimensions.1 as usize;
        if data.len() != expected {
            return Err(crate::error::CutoutError::processing(format!(
                "instance mask buffer has {} values, expected {} for {}x{}",
                data.len(),
                expected,
                dimensions.0,
                dimensions.1
            )));
        }
        Ok(Self { data, dimensions })
    }
}

/// A single detected object instance
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// COCO class identifier (0 = person)
    pub class_id: u32,
    /// Detection confidence in `[0, 1]`
    pub confidence: f32,
    /// Bounding box in source-image coordinates
    pub bbox: BoundingBox,
    /// Optional pixel-level segmentation; `None` means box-only evidence
    pub mask: Option<InstanceMask>,
}

/// Ordered sequence of detected instances for one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub instances: Vec<Instance>,
}

impl DetectionResult {
    /// A result with no detections; extraction yields an all-zero mask
    #[must_use]
    pub fn empty() -> Self {
        Self {
            instances: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances matching `class_id` with confidence at or above `threshold`
    ///
    /// The backend is expected to pre-filter, but extraction re-applies the
    /// filter so unfiltered results are tolerated.
    pub fn qualifying(&self, class_id: u32, threshold: f32) -> impl Iterator<Item = &Instance> {
        self.instances
            .iter()
            .filter(move |i| i.class_id == class_id && i.confidence >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        assert!((b.iou(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn instance_mask_rejects_wrong_buffer_length() {
        assert!(InstanceMask::new(vec![0.0; 5], (2, 2)).is_err());
        assert!(InstanceMask::new(vec![0.0; 4], (2, 2)).is_ok());
    }

    #[test]
    fn qualifying_filters_class_and_confidence() {
        let result = DetectionResult {
            instances: vec![
                Instance {
                    class_id: 0,
                    confidence: 0.9,
                    bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
                    mask: None,
                },
                Instance {
                    class_id: 0,
                    confidence: 0.1,
                    bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
                    mask: None,
                },
                Instance {
                    class_id: 16,
                    confidence: 0.9,
                    bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
                    mask: None,
                },
            ],
        };
        assert_eq!(result.qualifying(0, 0.25).count(), 1);
    }
}
