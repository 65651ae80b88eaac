//! Test utilities and stub backends
//!
//! Stub implementations of [`DetectionModel`] and [`ModelLoader`] so the
//! registry and pipeline can be tested without model files or ONNX Runtime.

use crate::{
    detection::{BoundingBox, DetectionResult, Instance},
    error::{CutoutError, Result},
    inference::DetectionModel,
    models::ModelLoader,
};
use image::DynamicImage;
use std::sync::{Arc, Mutex};

/// Detection model that returns one canned person instance
#[derive(Debug, Clone)]
pub struct StubDetectionModel;

impl StubDetectionModel {
    /// The fixed result every `detect` call returns
    #[must_use]
    pub fn canned_result() -> DetectionResult {
        DetectionResult {
            instances: vec![Instance {
                class_id: 0,
                confidence: 0.9,
                bbox: BoundingBox::new(10.0, 10.0, 50.0, 50.0),
                mask: None,
            }],
        }
    }
}

impl DetectionModel for StubDetectionModel {
    fn detect(
        &self,
        _image: &DynamicImage,
        _class_id: u32,
        _confidence_threshold: f32,
    ) -> Result<DetectionResult> {
        Ok(Self::canned_result())
    }
}

/// Loader whose first N `load` calls fail, recording every attempt
pub struct FailThenSucceedLoader {
    failures_remaining: Mutex<usize>,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl FailThenSucceedLoader {
    /// Fail the first `n` load calls, then succeed with a stub model
    #[must_use]
    pub fn failing_first(n: usize) -> Self {
        Self {
            failures_remaining: Mutex::new(n),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared record of the identifiers passed to `load`, in order
    #[must_use]
    pub fn attempts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.attempts)
    }
}

impl ModelLoader for FailThenSucceedLoader {
    fn load(&self, identifier: &str) -> Result<Box<dyn DetectionModel>> {
        self.attempts.lock().unwrap().push(identifier.to_string());

        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining = remaining.saturating_sub(1);
            return Err(CutoutError::model(format!(
                "simulated load failure for {identifier}"
            )));
        }
        Ok(Box::new(StubDetectionModel))
    }
}
