//! Subject cutout processor
//!
//! Consolidates the pipeline stages — model acquisition, mask extraction,
//! refinement and compositing — behind one entry point used by the CLI and
//! the library functions.

use crate::{
    compositor::compose,
    config::RemovalConfig,
    error::{CutoutError, Result},
    mask::{extract_mask, refine_mask},
    models::ModelRegistry,
    types::CutoutResult,
};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{instrument, span, Level};

/// Runs the subject-isolation pipeline
///
/// Owns a reference to the model registry rather than relying on hidden
/// process-wide state; the registry is the only entity that outlives one
/// invocation. The processor itself is cheap to construct.
#[derive(Debug)]
pub struct CutoutProcessor {
    config: RemovalConfig,
    registry: Arc<ModelRegistry>,
}

impl CutoutProcessor {
    /// Create a processor backed by the shared ONNX registry for the
    /// configured model directory
    #[cfg(feature = "onnx")]
    #[must_use]
    pub fn new(config: RemovalConfig) -> Self {
        let registry = crate::models::shared_registry(&config.model_dir);
        Self { config, registry }
    }

    /// Create a processor with an explicitly injected registry
    #[must_use]
    pub fn with_registry(config: RemovalConfig, registry: Arc<ModelRegistry>) -> Self {
        Self { config, registry }
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &RemovalConfig {
        &self.config
    }

    /// Process an image file
    ///
    /// # Errors
    /// - [`CutoutError::InputNotFound`] when the input path does not exist
    /// - Image decode failures for undecodable bytes
    /// - [`CutoutError::ModelUnavailable`] when no candidate model loads
    pub fn process_file<P: AsRef<Path>>(&self, input_path: P) -> Result<CutoutResult> {
        let input_path = input_path.as_ref();
        if !input_path.exists() {
            return Err(CutoutError::InputNotFound(input_path.to_path_buf()));
        }

        let image = image::open(input_path)
            .map_err(|e| CutoutError::image_load_error(input_path, &e))?;
        tracing::debug!(
            path = %input_path.display(),
            width = image.width(),
            height = image.height(),
            "loaded input image"
        );
        self.process_image(&image)
    }

    /// Process an already-decoded image
    ///
    /// Model acquisition happens first so a missing model fails the request
    /// before any pixel work. The refined mask keeps the source dimensions
    /// and the strict binary invariant, so compositing cannot hit a
    /// dimension mismatch on this path.
    #[instrument(
        skip(self, image),
        fields(
            tier = %self.config.model_tier,
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    pub fn process_image(&self, image: &DynamicImage) -> Result<CutoutResult> {
        let handle = self.registry.acquire(self.config.model_tier)?;
        let original_dimensions = (image.width(), image.height());

        let detections = {
            let _span = span!(Level::INFO, "inference", model = %handle.version_tag()).entered();
            handle.model().detect(
                image,
                self.config.class_id,
                self.config.confidence_threshold,
            )?
        };

        let mask = {
            let _span = span!(Level::DEBUG, "mask_extraction").entered();
            extract_mask(
                original_dimensions.0,
                original_dimensions.1,
                &detections,
                self.config.class_id,
                self.config.confidence_threshold,
            )
        };

        if mask.statistics().foreground_pixels == 0 {
            log::warn!(
                "no foreground detected; output will be fully transparent \
                 (class {}, threshold {})",
                self.config.class_id,
                self.config.confidence_threshold
            );
        }

        let refined = {
            let _span = span!(Level::DEBUG, "mask_refinement").entered();
            refine_mask(&mask)?
        };

        let composed = compose(image, &refined)?;
        Ok(CutoutResult::new(
            DynamicImage::ImageRgba8(composed),
            refined,
            original_dimensions,
            handle.version_tag().to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::FailThenSucceedLoader;
    use crate::models::ModelTier;

    fn stub_processor() -> CutoutProcessor {
        let registry = Arc::new(ModelRegistry::new(Box::new(
            FailThenSucceedLoader::failing_first(0),
        )));
        let config = RemovalConfig::builder()
            .model_tier(ModelTier::Nano)
            .build()
            .unwrap();
        CutoutProcessor::with_registry(config, registry)
    }

    #[test]
    fn process_image_produces_rgba_with_tagged_model() {
        let processor = stub_processor();
        let image = DynamicImage::new_rgb8(100, 100);

        let result = processor.process_image(&image).unwrap();
        assert_eq!(result.original_dimensions, (100, 100));
        assert_eq!(result.model_tag, "yolo11n-seg");
        assert_eq!(result.image.color(), image::ColorType::Rgba8);
        assert!(result.mask.is_binary());
        assert_eq!(result.mask.dimensions, (100, 100));

        // The stub detection carries a (10,10)-(50,50) box; after refinement
        // the interior must still be foreground and the far corner background.
        let rgba = result.image.to_rgba8();
        assert_eq!(rgba.get_pixel(30, 30)[3], 255);
        assert_eq!(rgba.get_pixel(90, 90)[3], 0);
    }

    #[test]
    fn missing_input_file_is_fatal() {
        let processor = stub_processor();
        let err = processor.process_file("no/such/image.jpg").unwrap_err();
        assert!(matches!(err, CutoutError::InputNotFound(_)));
    }

    #[test]
    fn unreadable_image_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.jpg");
        std::fs::write(&path, b"these are not pixels").unwrap();

        let processor = stub_processor();
        let err = processor.process_file(&path).unwrap_err();
        assert!(matches!(err, CutoutError::Processing(_)));
    }
}
