#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # Subject cutout and resize
//!
//! Turns a photograph into a transparent-background cutout of a detected
//! subject, or into a resized copy. Foreground evidence comes from a YOLO
//! segmentation model run through ONNX Runtime; the pipeline reduces it to a
//! single binary mask, refines it morphologically, and composites it with
//! the source pixels into an RGBA PNG.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bgcutout::{remove_background, resize_image, RemovalConfig, ModelTier, SizeSpec};
//!
//! # fn example() -> bgcutout::Result<()> {
//! let config = RemovalConfig::builder()
//!     .model_tier(ModelTier::Small)
//!     .confidence_threshold(0.3)
//!     .build()?;
//! remove_background("photo.jpg", "photo_no_bg.png", &config)?;
//!
//! resize_image("photo.jpg", "thumb.jpg", &SizeSpec::Scale(25.0))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! - `onnx` (default): ONNX Runtime detection backend
//! - `cli` (default): command-line interface

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod detection;
pub mod error;
pub mod inference;
pub mod mask;
pub mod models;
pub mod processor;
pub mod resize;
pub mod types;

use std::path::{Path, PathBuf};

// Public API exports
#[cfg(feature = "onnx")]
pub use backends::{OnnxDetectionModel, OnnxModelLoader};
pub use compositor::compose;
pub use config::{
    RemovalConfig, RemovalConfigBuilder, DEFAULT_CONFIDENCE_THRESHOLD, PERSON_CLASS_ID,
};
pub use detection::{BoundingBox, DetectionResult, Instance, InstanceMask};
pub use error::{CutoutError, ModelLoadAttempt, Result};
pub use inference::DetectionModel;
pub use mask::{extract_mask, refine_mask};
pub use models::{ModelHandle, ModelLoader, ModelRegistry, ModelTier};
pub use processor::CutoutProcessor;
pub use resize::{resize, resize_image, SizeSpec};
pub use types::{CutoutResult, MaskStatistics, SubjectMask};

/// Remove the background from an image file
///
/// Writes the cutout to `output_path` and returns the path actually written.
/// The output is always a lossless RGBA PNG so the alpha channel survives; a
/// non-`.png` extension on `output_path` is replaced.
///
/// # Errors
/// - [`CutoutError::InputNotFound`] when the input path does not exist
/// - [`CutoutError::ModelUnavailable`] when no candidate model loads; this
///   is returned before any pixel work happens
/// - Image decode failures for undecodable input bytes
#[cfg(feature = "onnx")]
pub fn remove_background<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    config: &RemovalConfig,
) -> Result<PathBuf> {
    let output_path = ensure_png_extension(output_path.as_ref());

    let processor = CutoutProcessor::new(config.clone());
    let result = processor.process_file(input_path.as_ref())?;
    result.save_png(&output_path)?;

    log::info!(
        "background removed: {} -> {} (model {})",
        input_path.as_ref().display(),
        output_path.display(),
        result.model_tag
    );
    Ok(output_path)
}

/// Default output path for a cutout: `<stem>_no_bg.png` next to the input
#[must_use]
pub fn default_cutout_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy().into_owned());
    input_path.with_file_name(format!("{stem}_no_bg.png"))
}

/// Replace any non-PNG extension so the alpha channel is kept losslessly
fn ensure_png_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => path.to_path_buf(),
        _ => path.with_extension("png"),
    }
}
