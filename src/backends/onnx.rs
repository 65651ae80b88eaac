//! ONNX Runtime backend for YOLO segmentation models
//!
//! Loads exported `*-seg` models and decodes their outputs into
//! [`DetectionResult`]s: the prediction tensor carries box coordinates, class
//! scores and mask coefficients per anchor; the prototype tensor carries the
//! shared mask basis. Per-instance masks are the sigmoid of the coefficient /
//! prototype product, cropped to the instance box.

use crate::{
    detection::{BoundingBox, DetectionResult, Instance, InstanceMask},
    error::{CutoutError, Result},
    inference::DetectionModel,
    models::ModelLoader,
};
use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array4, ArrayView3, ArrayView4};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::PathBuf;
use std::sync::Mutex;

/// Input size assumed when the model reports a dynamic spatial dimension
const DEFAULT_INPUT_SIZE: u32 = 640;

/// IoU threshold for non-maximum suppression
const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Gray value used for letterbox padding, normalized
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Loader resolving candidate identifiers against a model directory
///
/// `yolo11n-seg` resolves to `<model_dir>/yolo11n-seg.onnx`.
#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    model_dir: PathBuf,
}

impl OnnxModelLoader {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, identifier: &str) -> Result<Box<dyn DetectionModel>> {
        let path = self.model_dir.join(format!("{identifier}.onnx"));
        if !path.exists() {
            return Err(CutoutError::model(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        let model = OnnxDetectionModel::from_file(&path)?;
        Ok(Box::new(model))
    }
}

/// A loaded YOLO segmentation model
///
/// The session is guarded by a mutex so a cached model can be shared
/// read-only across threads; ONNX Runtime requires exclusive access per run.
pub struct OnnxDetectionModel {
    session: Mutex<Session>,
    input_size: u32,
}

impl OnnxDetectionModel {
    /// Build a session from an ONNX file and read its expected input size
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| CutoutError::inference(format!("failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| CutoutError::inference(format!("failed to set optimization level: {e}")))?
            .with_intra_threads(
                std::thread::available_parallelism()
                    .map(std::num::NonZero::get)
                    .unwrap_or(4),
            )
            .map_err(|e| CutoutError::inference(format!("failed to set intra threads: {e}")))?
            .commit_from_file(path)
            .map_err(|e| {
                CutoutError::model(format!("failed to load model {}: {e}", path.display()))
            })?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| input.dtype().tensor_shape())
            .and_then(|shape| shape.get(2).copied())
            .filter(|&dim| dim > 0)
            .map_or(DEFAULT_INPUT_SIZE, |dim| dim as u32);

        log::debug!(
            "ONNX session ready for {} (input {input_size}x{input_size})",
            path.display()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }
}

impl std::fmt::Debug for OnnxDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetectionModel")
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl DetectionModel for OnnxDetectionModel {
    fn detect(
        &self,
        image: &DynamicImage,
        class_id: u32,
        confidence_threshold: f32,
    ) -> Result<DetectionResult> {
        let transform = Letterbox::fit(image, self.input_size);
        let tensor = transform.to_tensor(image);

        let input_value = Value::from_array(tensor)
            .map_err(|e| CutoutError::processing(format!("failed to convert input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| CutoutError::inference("ONNX session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| CutoutError::inference(format!("ONNX inference failed: {e}")))?;

        let predictions = outputs
            .get("output0")
            .ok_or_else(|| CutoutError::inference("prediction tensor 'output0' missing"))?
            .try_extract_array::<f32>()
            .map_err(|e| CutoutError::inference(format!("failed to extract predictions: {e}")))?;
        let predictions = predictions
            .into_dimensionality::<ndarray::Ix3>()
            .map_err(|e| CutoutError::inference(format!("unexpected prediction shape: {e}")))?;

        // Segmentation exports carry a second output with mask prototypes;
        // detection-only exports do not, which leaves the box fallback path.
        let prototypes = outputs
            .get("output1")
            .map(|value| {
                value
                    .try_extract_array::<f32>()
                    .map_err(|e| {
                        CutoutError::inference(format!("failed to extract prototypes: {e}"))
                    })
                    .and_then(|array| {
                        array.into_dimensionality::<ndarray::Ix4>().map_err(|e| {
                            CutoutError::inference(format!("unexpected prototype shape: {e}"))
                        })
                    })
            })
            .transpose()?;

        let candidates = decode_candidates(
            &predictions.view(),
            prototypes.as_ref().map(|p| p.dim().1).unwrap_or(0),
            class_id,
            confidence_threshold,
            image.width(),
            image.height(),
            &transform,
        )?;
        let kept = non_max_suppression(candidates, NMS_IOU_THRESHOLD);

        tracing::debug!(
            instances = kept.len(),
            class_id,
            "decoded detections after NMS"
        );

        let mut instances = Vec::with_capacity(kept.len());
        for candidate in kept {
            let mask = match &prototypes {
                Some(protos) => Some(candidate.build_mask(
                    &protos.view(),
                    &transform,
                    image.width(),
                    image.height(),
                )?),
                None => None,
            };
            instances.push(Instance {
                class_id,
                confidence: candidate.confidence,
                bbox: candidate.bbox,
                mask,
            });
        }

        Ok(DetectionResult { instances })
    }
}

/// Letterbox geometry mapping the source image into the model input square
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    input_size: u32,
    scale: f32,
    pad_x: u32,
    pad_y: u32,
    content_width: u32,
    content_height: u32,
}

impl Letterbox {
    fn fit(image: &DynamicImage, input_size: u32) -> Self {
        let (width, height) = (image.width(), image.height());
        let scale =
            (input_size as f32 / width as f32).min(input_size as f32 / height as f32);
        let content_width = ((width as f32 * scale).round() as u32).clamp(1, input_size);
        let content_height = ((height as f32 * scale).round() as u32).clamp(1, input_size);
        Self {
            input_size,
            scale,
            pad_x: (input_size - content_width) / 2,
            pad_y: (input_size - content_height) / 2,
            content_width,
            content_height,
        }
    }

    /// Normalized NCHW tensor with the image centered on gray padding
    fn to_tensor(&self, image: &DynamicImage) -> Array4<f32> {
        let resized = image
            .resize_exact(self.content_width, self.content_height, FilterType::Triangle)
            .to_rgb8();

        let size = self.input_size as usize;
        let mut tensor = Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);
        for (x, y, pixel) in resized.enumerate_pixels() {
            let tx = (x + self.pad_x) as usize;
            let ty = (y + self.pad_y) as usize;
            for channel in 0..3 {
                tensor[[0, channel, ty, tx]] = f32::from(pixel[channel]) / 255.0;
            }
        }
        tensor
    }

    /// Map a box center/extent in input coordinates back to source pixels
    fn box_to_source(&self, cx: f32, cy: f32, w: f32, h: f32, src_w: u32, src_h: u32) -> BoundingBox {
        let x1 = ((cx - w / 2.0 - self.pad_x as f32) / self.scale).clamp(0.0, src_w as f32);
        let y1 = ((cy - h / 2.0 - self.pad_y as f32) / self.scale).clamp(0.0, src_h as f32);
        let x2 = ((cx + w / 2.0 - self.pad_x as f32) / self.scale).clamp(0.0, src_w as f32);
        let y2 = ((cy + h / 2.0 - self.pad_y as f32) / self.scale).clamp(0.0, src_h as f32);
        BoundingBox::new(x1, y1, x2, y2)
    }
}

/// One anchor that passed the confidence filter
struct Candidate {
    bbox: BoundingBox,
    confidence: f32,
    mask_coefficients: Vec<f32>,
}

impl Candidate {
    /// Multiply coefficients against the prototype basis and crop to the box
    ///
    /// The mask is produced at prototype resolution restricted to the
    /// letterbox content region; the extractor resizes it to the source
    /// resolution.
    fn build_mask(
        &self,
        prototypes: &ArrayView4<'_, f32>,
        transform: &Letterbox,
        src_w: u32,
        src_h: u32,
    ) -> Result<InstanceMask> {
        let (_, coeff_count, proto_h, proto_w) = prototypes.dim();
        if coeff_count != self.mask_coefficients.len() {
            return Err(CutoutError::inference(format!(
                "prototype count {} does not match {} mask coefficients",
                coeff_count,
                self.mask_coefficients.len()
            )));
        }

        let ratio = proto_w as f32 / transform.input_size as f32;
        let origin_x = (transform.pad_x as f32 * ratio).round() as usize;
        let origin_y = (transform.pad_y as f32 * ratio).round() as usize;
        let width = (((transform.content_width as f32) * ratio).round() as usize)
            .clamp(1, proto_w - origin_x.min(proto_w - 1));
        let height = (((transform.content_height as f32) * ratio).round() as usize)
            .clamp(1, proto_h - origin_y.min(proto_h - 1));

        let mut data = Vec::with_capacity(width * height);
        for py in 0..height {
            // Source-image y for box cropping
            let src_y = (py as f32 + 0.5) / height as f32 * src_h as f32;
            for px in 0..width {
                let src_x = (px as f32 + 0.5) / width as f32 * src_w as f32;
                let inside = src_x >= self.bbox.x1
                    && src_x < self.bbox.x2
                    && src_y >= self.bbox.y1
                    && src_y < self.bbox.y2;
                if !inside {
                    data.push(0.0);
                    continue;
                }

                let mut logit = 0.0f32;
                for (k, coefficient) in self.mask_coefficients.iter().enumerate() {
                    logit += coefficient * prototypes[[0, k, origin_y + py, origin_x + px]];
                }
                data.push(sigmoid(logit));
            }
        }

        InstanceMask::new(data, (width as u32, height as u32))
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Decode prediction columns into confidence-filtered candidates
///
/// Prediction layout per anchor is `[cx, cy, w, h, class scores…, mask
/// coefficients…]`; the class count is whatever remains after the box and
/// coefficient channels.
fn decode_candidates(
    predictions: &ArrayView3<'_, f32>,
    coefficient_count: usize,
    class_id: u32,
    confidence_threshold: f32,
    src_w: u32,
    src_h: u32,
    transform: &Letterbox,
) -> Result<Vec<Candidate>> {
    let (_, channels, anchors) = predictions.dim();
    let class_count = channels
        .checked_sub(4 + coefficient_count)
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            CutoutError::inference(format!(
                "prediction tensor has {channels} channels, too few for {coefficient_count} mask coefficients"
            ))
        })?;
    if class_id as usize >= class_count {
        return Err(CutoutError::invalid_config(format!(
            "class id {class_id} out of range for model with {class_count} classes"
        )));
    }

    let score_row = 4 + class_id as usize;
    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let confidence = predictions[[0, score_row, anchor]];
        if confidence < confidence_threshold {
            continue;
        }

        let cx = predictions[[0, 0, anchor]];
        let cy = predictions[[0, 1, anchor]];
        let w = predictions[[0, 2, anchor]];
        let h = predictions[[0, 3, anchor]];
        let bbox = transform.box_to_source(cx, cy, w, h, src_w, src_h);
        if bbox.area() <= 0.0 {
            continue;
        }

        let mask_coefficients = (0..coefficient_count)
            .map(|k| predictions[[0, 4 + class_count + k, anchor]])
            .collect();
        candidates.push(Candidate {
            bbox,
            confidence,
            mask_coefficients,
        });
    }
    Ok(candidates)
}

/// Greedy IoU-based non-maximum suppression, highest confidence first
fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept
            .iter()
            .all(|existing| existing.bbox.iou(&candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
