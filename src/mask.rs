//! Mask extraction and refinement
//!
//! Extraction reduces a [`DetectionResult`] to one binary mask at source
//! resolution: per-instance segmentation masks are resized, thresholded and
//! unioned, with bounding boxes as a rectangular fallback when the model
//! returned no pixel-level data. Refinement then removes noise specks, fills
//! small holes and anti-aliases the edges while restoring the strict
//! {0, 255} invariant.

use crate::{
    detection::{DetectionResult, Instance},
    error::Result,
    types::SubjectMask,
};
use image::{imageops, imageops::FilterType, ImageBuffer, Luma};
use imageproc::{
    distance_transform::Norm,
    filter::gaussian_blur_f32,
    map::map_colors,
    morphology::{close, open},
};

/// Probability above which an instance-mask pixel counts as foreground
const INSTANCE_MASK_THRESHOLD: f32 = 0.5;

/// Gray value above which a blurred mask pixel is restored to foreground
const BINARY_THRESHOLD: u8 = 127;

/// Sigma matching OpenCV's default for a 3x3 Gaussian kernel
const BLUR_SIGMA: f32 = 0.8;

/// Build a binary mask for one target class from a detection result
///
/// Instances are re-filtered by `class_id` and `confidence_threshold` even
/// though the backend filters too, so unfiltered results are handled. When
/// any qualifying instance carries a segmentation mask, those masks are
/// resized to `width`x`height` with nearest-neighbor interpolation (hard
/// edges, no new confidence values), thresholded at 0.5 and unioned by
/// pixel-wise maximum. Otherwise the bounding boxes are filled as rectangular
/// foreground. No qualifying instance at all yields an all-zero mask, which
/// is a valid, fully transparent outcome.
#[must_use]
pub fn extract_mask(
    width: u32,
    height: u32,
    detections: &DetectionResult,
    class_id: u32,
    confidence_threshold: f32,
) -> SubjectMask {
    let qualifying: Vec<&Instance> = detections
        .qualifying(class_id, confidence_threshold)
        .collect();

    if qualifying.is_empty() {
        log::debug!("no qualifying instance for class {class_id}; returning empty mask");
        return SubjectMask::zeros(width, height);
    }

    let mut mask = SubjectMask::zeros(width, height);

    let with_masks: Vec<&Instance> = qualifying
        .iter()
        .copied()
        .filter(|i| i.mask.is_some())
        .collect();

    if with_masks.is_empty() {
        // Box-only fallback: union of filled rectangles
        tracing::debug!(
            instances = qualifying.len(),
            "no segmentation data; falling back to bounding boxes"
        );
        for instance in &qualifying {
            fill_box(&mut mask, instance);
        }
    } else {
        tracing::debug!(
            instances = with_masks.len(),
            "combining instance segmentation masks"
        );
        for instance in &with_masks {
            union_instance_mask(&mut mask, instance, width, height);
        }
    }

    let stats = mask.statistics();
    log::debug!(
        "extracted mask: {}/{} foreground pixels ({:.1}%)",
        stats.foreground_pixels,
        stats.total_pixels,
        stats.coverage * 100.0
    );

    mask
}

/// Union one instance's soft mask into the combined mask
fn union_instance_mask(mask: &mut SubjectMask, instance: &Instance, width: u32, height: u32) {
    let Some(instance_mask) = &instance.mask else {
        return;
    };

    let (mask_width, mask_height) = instance_mask.dimensions;
    let binarized: Vec<u8> = if (mask_width, mask_height) == (width, height) {
        instance_mask
            .data
            .iter()
            .map(|&p| u8::from(p > INSTANCE_MASK_THRESHOLD) * 255)
            .collect()
    } else {
        // Nearest-neighbor preserves hard edges and introduces no new
        // confidence values.
        let Some(buffer) = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(
            mask_width,
            mask_height,
            instance_mask.data.clone(),
        ) else {
            return;
        };
        let resized = imageops::resize(&buffer, width, height, FilterType::Nearest);
        resized
            .as_raw()
            .iter()
            .map(|&p| u8::from(p > INSTANCE_MASK_THRESHOLD) * 255)
            .collect()
    };

    for (combined, value) in mask.data.iter_mut().zip(binarized) {
        *combined = (*combined).max(value);
    }
}

/// Fill an instance's bounding box as foreground, clipped to image extents
///
/// The fill is half-open: rows `[y1, y2)` and columns `[x1, x2)`.
fn fill_box(mask: &mut SubjectMask, instance: &Instance) {
    let (width, height) = mask.dimensions;
    let x1 = (instance.bbox.x1 as i64).clamp(0, i64::from(width)) as u32;
    let y1 = (instance.bbox.y1 as i64).clamp(0, i64::from(height)) as u32;
    let x2 = (instance.bbox.x2 as i64).clamp(0, i64::from(width)) as u32;
    let y2 = (instance.bbox.y2 as i64).clamp(0, i64::from(height)) as u32;

    for y in y1..y2 {
        let row = y as usize * width as usize;
        for x in x1..x2 {
            mask.data[row + x as usize] = 255;
        }
    }
}

/// Denoise and smooth a binary mask while keeping it binary
///
/// Steps are fixed and order-sensitive: a 3x3 morphological opening (one
/// iteration) removes isolated noise specks before the two-iteration closing
/// fills small holes in the foreground; a 3x3 Gaussian blur then softens the
/// staircased edges and a re-threshold at 127 restores the binary invariant.
///
/// # Errors
/// Returns a processing error if the mask buffer is inconsistent with its
/// dimensions.
pub fn refine_mask(mask: &SubjectMask) -> Result<SubjectMask> {
    let image = mask.to_image()?;

    let opened = open(&image, Norm::LInf, 1);
    let closed = close(&opened, Norm::LInf, 2);
    let blurred = gaussian_blur_f32(&closed, BLUR_SIGMA);
    let rethresholded = map_colors(&blurred, |Luma([p])| {
        Luma([u8::from(p > BINARY_THRESHOLD) * 255])
    });

    Ok(SubjectMask::from_image(&rethresholded))
}
