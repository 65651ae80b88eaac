//! Configuration types for cutout operations

use crate::{
    error::{CutoutError, Result},
    models::ModelTier,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// COCO class identifier for "person", the default cutout subject
pub const PERSON_CLASS_ID: u32 = 0;

/// Default detection confidence threshold
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Default directory searched for exported model files
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Configuration for a background removal invocation
///
/// Out-of-range parameters are rejected at build time, never clamped; the
/// same policy applies at the CLI boundary so both call sites agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalConfig {
    /// Model capability tier to load
    pub model_tier: ModelTier,
    /// Class to isolate (COCO id; 0 = person)
    pub class_id: u32,
    /// Minimum detection confidence, in `[0, 1]`
    pub confidence_threshold: f32,
    /// Directory containing exported `*.onnx` model files
    pub model_dir: PathBuf,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            model_tier: ModelTier::default(),
            class_id: PERSON_CLASS_ID,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
        }
    }
}

impl RemovalConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder::new()
    }
}

/// Builder for [`RemovalConfig`]
#[derive(Debug, Default)]
pub struct RemovalConfigBuilder {
    config: RemovalConfig,
}

impl RemovalConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RemovalConfig::default(),
        }
    }

    #[must_use]
    pub fn model_tier(mut self, tier: ModelTier) -> Self {
        self.config.model_tier = tier;
        self
    }

    #[must_use]
    pub fn class_id(mut self, class_id: u32) -> Self {
        self.config.class_id = class_id;
        self
    }

    #[must_use]
    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    #[must_use]
    pub fn model_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.model_dir = dir.into();
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// Returns [`CutoutError::InvalidConfig`] when the confidence threshold
    /// is not a finite value in `[0, 1]`.
    pub fn build(self) -> Result<RemovalConfig> {
        let threshold = self.config.confidence_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(CutoutError::invalid_config(format!(
                "confidence threshold must be between 0.0 and 1.0, got {threshold}"
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let config = RemovalConfig::builder().build().unwrap();
        assert_eq!(config.class_id, PERSON_CLASS_ID);
        assert!((config.confidence_threshold - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.model_tier, ModelTier::Nano);
    }

    #[test]
    fn threshold_bounds_are_inclusive() {
        assert!(RemovalConfig::builder()
            .confidence_threshold(0.0)
            .build()
            .is_ok());
        assert!(RemovalConfig::builder()
            .confidence_threshold(1.0)
            .build()
            .is_ok());
    }

    #[test]
    fn out_of_range_threshold_is_rejected_not_clamped() {
        for bad in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
            let result = RemovalConfig::builder().confidence_threshold(bad).build();
            assert!(
                matches!(result, Err(CutoutError::InvalidConfig(_))),
                "threshold {bad} should be rejected"
            );
        }
    }
}
