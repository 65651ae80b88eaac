//! Model tiers, candidate resolution and the process-wide model registry
//!
//! Loading a segmentation model is slow (file I/O plus session allocation),
//! so loaded models are cached per capability tier and shared behind `Arc`.
//! Candidate identifiers are tried newest-first; the first one that loads
//! becomes the cached handle and its identifier is kept as the version tag.

use crate::{
    error::{CutoutError, ModelLoadAttempt, Result},
    inference::DetectionModel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Model capability tier, newest-smallest to largest
///
/// Maps to the YOLO size suffix: `n`, `s`, `m`, `l`, `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ModelTier {
    /// Fastest, smallest model
    #[cfg_attr(feature = "cli", value(name = "n"))]
    Nano,
    /// Balanced speed and accuracy
    #[cfg_attr(feature = "cli", value(name = "s"))]
    Small,
    /// Better accuracy
    #[cfg_attr(feature = "cli", value(name = "m"))]
    Medium,
    /// High accuracy
    #[cfg_attr(feature = "cli", value(name = "l"))]
    Large,
    /// Best accuracy, slowest
    #[cfg_attr(feature = "cli", value(name = "x"))]
    XLarge,
}

impl ModelTier {
    /// The YOLO size suffix for this tier
    #[must_use]
    pub fn code(&self) -> char {
        match self {
            Self::Nano => 'n',
            Self::Small => 's',
            Self::Medium => 'm',
            Self::Large => 'l',
            Self::XLarge => 'x',
        }
    }

    /// Ordered candidate model identifiers for this tier, most capable
    /// generation first
    #[must_use]
    pub fn candidate_identifiers(&self) -> Vec<String> {
        let code = self.code();
        vec![
            format!("yolo11{code}-seg"),
            format!("yolo10{code}-seg"),
            format!("yolov8{code}-seg"),
        ]
    }
}

impl Default for ModelTier {
    fn default() -> Self {
        Self::Nano
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Loader for a single candidate model identifier
///
/// The ONNX implementation lives in `backends::onnx`; tests inject loaders
/// that fail selectively.
pub trait ModelLoader: Send + Sync {
    /// Load the model named by `identifier`
    ///
    /// # Errors
    /// - Model file missing or unreadable
    /// - Session initialization failures
    fn load(&self, identifier: &str) -> Result<Box<dyn DetectionModel>>;
}

/// A loaded model plus the candidate identifier that succeeded
pub struct ModelHandle {
    model: Box<dyn DetectionModel>,
    version_tag: String,
}

impl ModelHandle {
    /// The candidate identifier that loaded successfully
    #[must_use]
    pub fn version_tag(&self) -> &str {
        &self.version_tag
    }

    /// The loaded detection model
    #[must_use]
    pub fn model(&self) -> &dyn DetectionModel {
        self.model.as_ref()
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("version_tag", &self.version_tag)
            .finish_non_exhaustive()
    }
}

/// Cache of loaded models, keyed by capability tier
///
/// `acquire` is the only mutable state shared across concurrent pipeline
/// invocations. The slot mutex is held across the load-and-cache step, so a
/// first use under concurrency performs exactly one load; afterwards callers
/// share the cached handle read-only through `Arc`.
pub struct ModelRegistry {
    loader: Box<dyn ModelLoader>,
    slots: Mutex<HashMap<ModelTier, Arc<ModelHandle>>>,
}

impl ModelRegistry {
    /// Create a registry around a loader
    #[must_use]
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached handle for `tier`, loading it on first use
    ///
    /// Candidates are attempted in fixed preference order; the first success
    /// is cached for the life of the registry and subsequent calls return it
    /// without touching the loader again.
    ///
    /// # Errors
    /// Returns [`CutoutError::ModelUnavailable`] with the per-candidate
    /// failure reasons when every candidate fails; this is fatal for the
    /// invoking request.
    pub fn acquire(&self, tier: ModelTier) -> Result<Arc<ModelHandle>> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| CutoutError::model("model registry lock poisoned"))?;

        if let Some(handle) = slots.get(&tier) {
            return Ok(Arc::clone(handle));
        }

        let mut attempts = Vec::new();
        for identifier in tier.candidate_identifiers() {
            log::info!("loading segmentation model {identifier}");
            match self.loader.load(&identifier) {
                Ok(model) => {
                    tracing::info!(model = %identifier, "model loaded");
                    let handle = Arc::new(ModelHandle {
                        model,
                        version_tag: identifier,
                    });
                    slots.insert(tier, Arc::clone(&handle));
                    return Ok(handle);
                },
                Err(e) => {
                    log::warn!("model {identifier} not available: {e}");
                    attempts.push(ModelLoadAttempt {
                        identifier,
                        reason: e.to_string(),
                    });
                },
            }
        }

        Err(CutoutError::ModelUnavailable(attempts))
    }

    /// Whether a handle for `tier` is already cached
    #[must_use]
    pub fn is_loaded(&self, tier: ModelTier) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.contains_key(&tier))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry").finish_non_exhaustive()
    }
}

/// Process-wide ONNX-backed registry for a model directory
///
/// Registries are shared per directory so every caller using the same model
/// files also shares the loaded sessions.
#[cfg(feature = "onnx")]
pub fn shared_registry(model_dir: &std::path::Path) -> Arc<ModelRegistry> {
    use std::path::PathBuf;
    use std::sync::OnceLock;

    static REGISTRIES: OnceLock<Mutex<HashMap<PathBuf, Arc<ModelRegistry>>>> = OnceLock::new();

    let registries = REGISTRIES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut registries = registries
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Arc::clone(
        registries
            .entry(model_dir.to_path_buf())
            .or_insert_with(|| {
                Arc::new(ModelRegistry::new(Box::new(
                    crate::backends::onnx::OnnxModelLoader::new(model_dir.to_path_buf()),
                )))
            }),
    )
}
