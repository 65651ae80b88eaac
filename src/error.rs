//! Error types for cutout and resize operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cutout operations
pub type Result<T> = std::result::Result<T, CutoutError>;

/// One failed attempt at loading a candidate model identifier
#[derive(Debug, Clone)]
pub struct ModelLoadAttempt {
    /// Candidate model identifier (e.g. `yolo11n-seg`)
    pub identifier: String,
    /// Why the load failed
    pub reason: String,
}

impl std::fmt::Display for ModelLoadAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.identifier, self.reason)
    }
}

/// Error types for cutout and resize operations
#[derive(Error, Debug)]
pub enum CutoutError {
    /// Input/output errors (permission denied, truncated writes, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input path does not exist
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Bytes are present but not decodable as an image
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Every candidate model identifier failed to load
    #[error("no candidate model could be loaded: [{}]", format_attempts(.0))]
    ModelUnavailable(Vec<ModelLoadAttempt>),

    /// Mask and image dimensions disagree; an internal invariant violation
    #[error(
        "dimension mismatch: image is {}x{}, mask is {}x{}",
        expected.0, expected.1, actual.0, actual.1
    )]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Invalid configuration or parameters (threshold, size spec)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Backend inference errors
    #[error("inference error: {0}")]
    Inference(String),

    /// Model loading or initialization errors
    #[error("model error: {0}")]
    Model(String),

    /// Pixel-processing errors
    #[error("processing error: {0}")]
    Processing(String),
}

fn format_attempts(attempts: &[ModelLoadAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CutoutError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create an image loading error with path and format context
    pub fn image_load_error<P: AsRef<std::path::Path>>(path: P, error: &image::ImageError) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");
        Self::Processing(format!(
            "failed to decode image '{}' (format: {}): {}",
            path.as_ref().display(),
            extension,
            error
        ))
    }
}
