//! Core types for subject cutout operations

use crate::error::{CutoutError, Result};
use image::{DynamicImage, ImageBuffer, Luma, Rgba};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Single-channel binary mask at source-image resolution
///
/// The binary invariant — every value is exactly 0 or 255 — holds at every
/// stage boundary of the pipeline, though intermediate refinement steps may
/// briefly produce gray values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMask {
    /// Mask data as grayscale values, row-major
    pub data: Vec<u8>,
    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

/// Foreground coverage summary for a mask
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub foreground_pixels: usize,
    pub total_pixels: usize,
    /// Fraction of pixels that are foreground, in `[0, 1]`
    pub coverage: f64,
}

impl SubjectMask {
    /// Create a new mask from raw data
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// An all-zero (fully transparent) mask
    #[must_use]
    pub fn zeros(width: u32, height: u32) -> Self {
        Self::new(vec![0; width as usize * height as usize], (width, height))
    }

    /// Create a mask from a grayscale image
    #[must_use]
    pub fn from_image(image: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.as_raw().clone(), (width, height))
    }

    /// Convert the mask to a grayscale image
    pub fn to_image(&self) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone())
            .ok_or_else(|| CutoutError::processing("mask buffer does not match its dimensions"))
    }

    /// True if every pixel is exactly 0 or 255
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.data.iter().all(|&v| v == 0 || v == 255)
    }

    /// Foreground coverage statistics
    #[must_use]
    pub fn statistics(&self) -> MaskStatistics {
        let foreground_pixels = self.data.iter().filter(|&&v| v > 0).count();
        let total_pixels = self.data.len();
        let coverage = if total_pixels == 0 {
            0.0
        } else {
            foreground_pixels as f64 / total_pixels as f64
        };
        MaskStatistics {
            foreground_pixels,
            total_pixels,
            coverage,
        }
    }

    /// Write the mask into the alpha channel of an RGBA image
    ///
    /// # Errors
    /// Returns [`CutoutError::DimensionMismatch`] if the image and mask
    /// dimensions disagree.
    pub fn apply_to_image(&self, image: &mut ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<()> {
        let image_dimensions = image.dimensions();
        if image_dimensions != self.dimensions {
            return Err(CutoutError::DimensionMismatch {
                expected: image_dimensions,
                actual: self.dimensions,
            });
        }

        for (pixel, &alpha) in image.pixels_mut().zip(self.data.iter()) {
            pixel[3] = alpha;
        }
        Ok(())
    }
}

/// Result of a subject cutout operation
#[derive(Debug, Clone)]
pub struct CutoutResult {
    /// The RGBA image with background made transparent
    pub image: DynamicImage,
    /// The refined binary mask that was applied
    pub mask: SubjectMask,
    /// Original image dimensions (width, height)
    pub original_dimensions: (u32, u32),
    /// Identifier of the model candidate that produced the detections
    pub model_tag: String,
}

impl CutoutResult {
    #[must_use]
    pub fn new(
        image: DynamicImage,
        mask: SubjectMask,
        original_dimensions: (u32, u32),
        model_tag: String,
    ) -> Self {
        Self {
            image,
            mask,
            original_dimensions,
            model_tag,
        }
    }

    /// Save as PNG with alpha channel
    ///
    /// PNG is always used regardless of the path's extension so the alpha
    /// channel survives losslessly.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Get image dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}
