//! Face location: SCRFD detector via ONNX Runtime plus principal-face selection.
//!
//! SCRFD decodes anchors at three feature strides (8, 16, 32), which covers
//! small to large faces in one pass over a letterboxed input. Detections are
//! merged with NMS, mapped back to raster coordinates and clipped. Selection
//! then drops anything below the minimum face size and keeps the largest box.

use crate::config::DetectorConfig;
use crate::types::FaceRegion;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;

const SCRFD_INPUT_SIZE: usize = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;
const SCRFD_MIN_OUTPUTS: usize = 6;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download det_10g.onnx from insightface and place it in the model directory")]
    ModelNotFound(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("no face detected")]
    NoFaceDetected,
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// A face detection backend.
///
/// Implementations return candidate regions ranked by confidence. They must
/// be safe to share across concurrent classification calls.
pub trait FaceDetect: Send + Sync {
    fn detect(&self, raster: &RgbImage) -> Result<Vec<FaceRegion>, DetectorError>;
}

/// Run the detector and pick the principal face.
pub fn locate_face(
    detector: &dyn FaceDetect,
    raster: &RgbImage,
    config: &DetectorConfig,
) -> Result<FaceRegion, DetectorError> {
    ensure_non_empty(raster)?;
    let candidates = detector.detect(raster)?;
    tracing::debug!(candidates = candidates.len(), "face candidates");

    let face = select_principal(&candidates, config.min_face_size)
        .ok_or(DetectorError::NoFaceDetected)?;
    tracing::debug!(
        x = face.x,
        y = face.y,
        width = face.width,
        height = face.height,
        confidence = face.confidence,
        "principal face selected"
    );
    Ok(face)
}

/// A raster with a zero dimension cannot be letterboxed.
fn ensure_non_empty(raster: &RgbImage) -> Result<(), DetectorError> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectorError::InferenceFailed(format!("empty raster {width}x{height}")));
    }
    Ok(())
}

/// Largest qualifying region by area; equal areas keep the earlier one.
pub fn select_principal(candidates: &[FaceRegion], min_face_size: u32) -> Option<FaceRegion> {
    let mut best: Option<FaceRegion> = None;
    for face in candidates
        .iter()
        .filter(|f| f.width >= min_face_size && f.height >= min_face_size)
    {
        match best {
            Some(b) if face.area() <= b.area() => {}
            _ => best = Some(*face),
        }
    }
    best
}

/// Detection in letterbox-mapped float coordinates, before clipping.
#[derive(Debug, Clone)]
struct Detection {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    confidence: f32,
}

/// Metadata for coordinate de-mapping after letterbox resize.
struct LetterboxInfo {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Output tensor indices for one stride: (score_idx, bbox_idx).
type StrideOutputIndices = (usize, usize);

/// SCRFD-based face detector.
pub struct ScrfdDetector {
    /// Inference needs exclusive access to the session.
    session: Mutex<Session>,
    stride_indices: [StrideOutputIndices; 3],
    confidence_threshold: f32,
    nms_threshold: f32,
}

impl ScrfdDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &Path, config: &DetectorConfig) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        tracing::info!(
            path = %model_path.display(),
            outputs = ?output_names,
            "loaded SCRFD model"
        );

        if output_names.len() < SCRFD_MIN_OUTPUTS {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires score and bbox outputs for 3 strides, got {} outputs",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::debug!(?stride_indices, "SCRFD output tensor mapping");

        Ok(Self {
            session: Mutex::new(session),
            stride_indices,
            confidence_threshold: config.confidence_threshold,
            nms_threshold: config.nms_threshold,
        })
    }

    /// Resize into the fixed SCRFD input with centered padding, NCHW, RGB order.
    fn preprocess(raster: &RgbImage) -> (Array4<f32>, LetterboxInfo) {
        let (width, height) = raster.dimensions();
        let scale_w = SCRFD_INPUT_SIZE as f32 / width as f32;
        let scale_h = SCRFD_INPUT_SIZE as f32 / height as f32;
        let scale = scale_w.min(scale_h);

        let new_w = ((width as f32 * scale).round() as u32).clamp(1, SCRFD_INPUT_SIZE as u32);
        let new_h = ((height as f32 * scale).round() as u32).clamp(1, SCRFD_INPUT_SIZE as u32);
        let pad_x = (SCRFD_INPUT_SIZE as u32 - new_w) as f32 / 2.0;
        let pad_y = (SCRFD_INPUT_SIZE as u32 - new_h) as f32 / 2.0;

        let resized = imageops::resize(raster, new_w, new_h, FilterType::Triangle);

        // Padding value normalizes to 0.0.
        let mut tensor = Array4::<f32>::zeros((1, 3, SCRFD_INPUT_SIZE, SCRFD_INPUT_SIZE));
        let pad_x_start = pad_x.floor() as usize;
        let pad_y_start = pad_y.floor() as usize;

        for (x, y, pixel) in resized.enumerate_pixels() {
            let tx = pad_x_start + x as usize;
            let ty = pad_y_start + y as usize;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = (pixel[c] as f32 - SCRFD_MEAN) / SCRFD_STD;
            }
        }

        (tensor, LetterboxInfo { scale, pad_x, pad_y })
    }
}

impl FaceDetect for ScrfdDetector {
    fn detect(&self, raster: &RgbImage) -> Result<Vec<FaceRegion>, DetectorError> {
        ensure_non_empty(raster)?;
        let (input, letterbox) = Self::preprocess(raster);

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectorError::InferenceFailed("session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut all_detections = Vec::new();
        for (stride_pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx) = self.stride_indices[stride_pos];

            let (_, scores) = outputs[score_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("scores stride {stride}: {e}")))?;
            let (_, bboxes) = outputs[bbox_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("bboxes stride {stride}: {e}")))?;

            all_detections.extend(decode_stride(
                scores,
                bboxes,
                stride,
                &letterbox,
                self.confidence_threshold,
            ));
        }

        let (width, height) = raster.dimensions();
        Ok(nms(all_detections, self.nms_threshold)
            .iter()
            .filter_map(|d| clip_to_raster(d, width, height))
            .collect())
    }
}

/// Loads the SCRFD model on first use and shares it read-only afterwards.
///
/// A failed load is remembered; later calls report it without retrying.
pub struct LazyDetector {
    model_path: PathBuf,
    config: DetectorConfig,
    cell: OnceLock<Result<ScrfdDetector, String>>,
}

impl LazyDetector {
    pub fn new(model_path: impl Into<PathBuf>, config: DetectorConfig) -> Self {
        Self {
            model_path: model_path.into(),
            config,
            cell: OnceLock::new(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn get(&self) -> Result<&ScrfdDetector, DetectorError> {
        self.cell
            .get_or_init(|| {
                ScrfdDetector::load(&self.model_path, &self.config).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|msg| DetectorError::ModelUnavailable(msg.clone()))
    }
}

impl FaceDetect for LazyDetector {
    fn detect(&self, raster: &RgbImage) -> Result<Vec<FaceRegion>, DetectorError> {
        self.get()?.detect(raster)
    }
}

/// Discover output tensor ordering by name.
///
/// Named exports use "score_8", "bbox_16", ...; anything else falls back to
/// the standard positional layout [scores 8/16/32, bboxes 8/16/32, kps ...].
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let named: Option<Vec<StrideOutputIndices>> = SCRFD_STRIDES
        .iter()
        .map(|&stride| Some((find("score", stride)?, find("bbox", stride)?)))
        .collect();

    match named {
        Some(found) => {
            tracing::info!("SCRFD: using name-based output tensor mapping");
            [found[0], found[1], found[2]]
        }
        None => {
            tracing::info!(
                ?names,
                "SCRFD: output names not recognized, using positional mapping [0-2]=scores, [3-5]=bboxes"
            );
            [(0, 3), (1, 4), (2, 5)]
        }
    }
}

/// Decode detections for a single stride level.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    stride: usize,
    letterbox: &LetterboxInfo,
    threshold: f32,
) -> Vec<Detection> {
    let grid = SCRFD_INPUT_SIZE / stride;
    let num_anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;
    let step = stride as f32;

    let mut detections = Vec::new();
    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let bbox_off = idx * 4;
        if bbox_off + 3 >= bboxes.len() {
            continue;
        }

        let anchor_idx = idx / SCRFD_ANCHORS_PER_CELL;
        let anchor_cx = (anchor_idx % grid) as f32 * step;
        let anchor_cy = (anchor_idx / grid) as f32 * step;

        let x1 = anchor_cx - bboxes[bbox_off] * step;
        let y1 = anchor_cy - bboxes[bbox_off + 1] * step;
        let x2 = anchor_cx + bboxes[bbox_off + 2] * step;
        let y2 = anchor_cy + bboxes[bbox_off + 3] * step;

        let orig_x1 = (x1 - letterbox.pad_x) / letterbox.scale;
        let orig_y1 = (y1 - letterbox.pad_y) / letterbox.scale;
        let orig_x2 = (x2 - letterbox.pad_x) / letterbox.scale;
        let orig_y2 = (y2 - letterbox.pad_y) / letterbox.scale;

        detections.push(Detection {
            x: orig_x1,
            y: orig_y1,
            width: orig_x2 - orig_x1,
            height: orig_y2 - orig_y1,
            confidence: score,
        });
    }

    detections
}

/// Non-Maximum Suppression; output is sorted by descending confidence.
fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(detections[i].clone());

        for j in (i + 1)..detections.len() {
            if !suppressed[j] && iou(&detections[i], &detections[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union_area = a.width * a.height + b.width * b.height - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}

/// Clip to the raster and snap to whole pixels; `None` if nothing remains.
fn clip_to_raster(det: &Detection, width: u32, height: u32) -> Option<FaceRegion> {
    let x1 = det.x.round().clamp(0.0, width as f32) as u32;
    let y1 = det.y.round().clamp(0.0, height as f32) as u32;
    let x2 = (det.x + det.width).round().clamp(0.0, width as f32) as u32;
    let y2 = (det.y + det.height).round().clamp(0.0, height as f32) as u32;

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(FaceRegion {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
        confidence: det.confidence,
    })
}

/// Detector that returns a fixed list of regions, for exercising the pipeline
/// without a model file.
#[cfg(test)]
pub(crate) struct FixedDetector(pub Vec<FaceRegion>);

#[cfg(test)]
impl FaceDetect for FixedDetector {
    fn detect(&self, _raster: &RgbImage) -> Result<Vec<FaceRegion>, DetectorError> {
        Ok(self.0.clone())
    }
}
