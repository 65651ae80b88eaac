//! Detection backend implementations
//!
//! The ONNX Runtime backend runs exported YOLO segmentation models. Test
//! utilities provide stub models and loaders so the pipeline can be exercised
//! without model files.

#[cfg(feature = "onnx")]
pub mod onnx;

// Test utilities for backend and registry testing
#[cfg(test)]
pub mod test_utils;

#[cfg(feature = "onnx")]
pub use self::onnx::{OnnxDetectionModel, OnnxModelLoader};
