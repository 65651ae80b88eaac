//! Compositing of source pixels and refined mask into an RGBA image

use crate::{error::Result, types::SubjectMask};
use image::{DynamicImage, RgbaImage};

/// Merge source pixels and a refined mask into an RGBA image
///
/// Channels 1-3 are copied unchanged from the source; channel 4 is the mask.
/// The caller serializes the result losslessly (PNG), so no re-encoding loss
/// is introduced on the RGB channels.
///
/// # Errors
/// Returns [`crate::error::CutoutError::DimensionMismatch`] when the mask and
/// image dimensions disagree; the pipeline guarantees this never happens when
/// invoked correctly, so a mismatch is an internal invariant violation.
pub fn compose(image: &DynamicImage, mask: &SubjectMask) -> Result<RgbaImage> {
    let mut rgba = image.to_rgba8();
    mask.apply_to_image(&mut rgba)?;
    Ok(rgba)
}
