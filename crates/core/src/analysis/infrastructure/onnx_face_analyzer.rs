/// Face analysis backed by ONNX Runtime: YOLO-style detection with
/// 5-point landmarks, plus an ArcFace-style identity embedder.
///
/// Weights resolve through the shared model resolver (cache or download)
/// up front; sessions are created lazily on first use and guarded by
/// mutexes so the analyzer can be shared across processors.
use std::path::PathBuf;
use std::sync::Mutex;

use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::shared::constants::{
    DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL, EMBEDDER_MODEL_NAME, EMBEDDER_MODEL_URL,
};
use crate::shared::face::{l2_normalize, BoundingBox, Face, FaceLandmarks};
use crate::shared::frame::Frame;
use crate::shared::model_resolver;

pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

/// Detector input resolution (square letterbox).
const DETECTOR_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoint values per detection (5 landmarks × x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Embedder input resolution and normalization.
const EMBED_INPUT_SIZE: usize = 112;
const EMBED_NORM_MEAN: f32 = 127.5;
const EMBED_NORM_STD: f32 = 127.5;

pub struct OnnxFaceAnalyzer {
    detector_path: PathBuf,
    embedder_path: PathBuf,
    detector: Mutex<Option<ort::session::Session>>,
    embedder: Mutex<Option<ort::session::Session>>,
    score_threshold: f64,
}

impl OnnxFaceAnalyzer {
    /// Resolves both model files, downloading into the cache on first
    /// use. Sessions are not created until the first detection call.
    pub fn new(
        score_threshold: f64,
        progress: Option<fn(u64, u64)>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let detector_path = model_resolver::resolve(
            DETECTOR_MODEL_NAME,
            DETECTOR_MODEL_URL,
            progress.map(|f| Box::new(f) as model_resolver::ProgressFn),
        )?;
        let embedder_path = model_resolver::resolve(
            EMBEDDER_MODEL_NAME,
            EMBEDDER_MODEL_URL,
            progress.map(|f| Box::new(f) as model_resolver::ProgressFn),
        )?;
        Ok(Self {
            detector_path,
            embedder_path,
            detector: Mutex::new(None),
            embedder: Mutex::new(None),
            score_threshold,
        })
    }

    fn embed(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let tensor = preprocess_crop(frame, bbox);
        let input_value = ort::value::Tensor::from_array(tensor)?;

        let mut guard = self
            .embedder
            .lock()
            .map_err(|e| format!("lock poisoned: {e}"))?;
        if guard.is_none() {
            *guard = Some(load_session(&self.embedder_path)?);
        }
        let session = guard.as_mut().expect("session initialized above");

        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn detect_faces(&self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
        let fw = frame.width() as f64;
        let fh = frame.height() as f64;

        // 1. Preprocess: letterbox + normalize → NCHW float32
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, DETECTOR_INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;

        // 2. Inference
        let raw_dets = {
            let mut guard = self
                .detector
                .lock()
                .map_err(|e| format!("lock poisoned: {e}"))?;
            if guard.is_none() {
                *guard = Some(load_session(&self.detector_path)?);
            }
            let session = guard.as_mut().expect("session initialized above");

            let outputs = session.run(ort::inputs![input_value])?;
            if outputs.len() == 0 {
                return Err("detector produced no outputs".into());
            }
            let tensor = outputs[0].try_extract_array::<f32>()?;
            parse_detections(&tensor, self.score_threshold, scale, pad_x, pad_y)?
            // Detector lock released before the embedder runs
        };

        // 3. NMS, then embed each surviving face
        let mut dets = raw_dets;
        let kept = nms(&mut dets, NMS_IOU_THRESH);

        let mut faces = Vec::with_capacity(kept.len());
        for det in kept {
            let bbox = BoundingBox {
                x1: det.x1.clamp(0.0, fw),
                y1: det.y1.clamp(0.0, fh),
                x2: det.x2.clamp(0.0, fw),
                y2: det.y2.clamp(0.0, fh),
            };
            if bbox.area() == 0.0 {
                continue;
            }
            let embedding = self.embed(frame, &bbox)?;
            faces.push(Face {
                bounding_box: bbox,
                landmarks: FaceLandmarks::new(det.keypoints.unwrap_or([(0.0, 0.0); 5])),
                embedding,
                score: det.confidence,
                age: None,
                gender: None,
            });
        }
        Ok(faces)
    }
}

fn load_session(path: &std::path::Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    Ok(ort::session::Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?)
}

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    keypoints: Option<[(f64, f64); 5]>,
}

/// Parses the detector output, handling both `[1, features, detections]`
/// and `[1, detections, features]` layouts, and maps coordinates from
/// letterbox space back to the original frame.
fn parse_detections(
    tensor: &ndarray::ArrayViewD<'_, f32>,
    score_threshold: f64,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
    let shape = tensor.shape();
    if shape.len() != 3 {
        return Err(format!("unexpected detector output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    let data = tensor.as_slice().ok_or("cannot get tensor slice")?;

    let mut raw_dets = Vec::new();
    for i in 0..num_dets {
        let row: Vec<f32> = if transposed {
            (0..num_feats).map(|f| data[f * num_dets + i]).collect()
        } else {
            data[i * num_feats..(i + 1) * num_feats].to_vec()
        };

        // row format: [cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]
        if row.len() < 5 {
            continue;
        }
        let conf = row[4] as f64;
        if conf < score_threshold {
            continue;
        }

        let cx = row[0] as f64;
        let cy = row[1] as f64;
        let w = row[2] as f64;
        let h = row[3] as f64;

        let x1 = ((cx - w / 2.0) - pad_x as f64) / scale;
        let y1 = ((cy - h / 2.0) - pad_y as f64) / scale;
        let x2 = ((cx + w / 2.0) - pad_x as f64) / scale;
        let y2 = ((cy + h / 2.0) - pad_y as f64) / scale;

        let keypoints = if row.len() >= 5 + NUM_KEYPOINT_VALUES {
            let mut pts = [(0.0f64, 0.0f64); 5];
            for k in 0..5 {
                let kconf = row[5 + k * 3 + 2] as f64;
                if kconf >= KEYPOINT_CONF_THRESH {
                    let kx = row[5 + k * 3] as f64;
                    let ky = row[5 + k * 3 + 1] as f64;
                    pts[k] = ((kx - pad_x as f64) / scale, (ky - pad_y as f64) / scale);
                }
            }
            Some(pts)
        } else {
            None
        };

        raw_dets.push(RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence: conf,
            keypoints,
        });
    }
    Ok(raw_dets)
}

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padded region filled with 114/255 gray, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray(); // [H, W, C] u8
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize + copy into padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

/// Crops the face region, resizes to 112×112, normalizes, NCHW layout.
fn preprocess_crop(frame: &Frame, bbox: &BoundingBox) -> ndarray::Array4<f32> {
    let fw = frame.width() as usize;
    let fh = frame.height() as usize;
    let x1 = (bbox.x1.max(0.0) as usize).min(fw.saturating_sub(1));
    let y1 = (bbox.y1.max(0.0) as usize).min(fh.saturating_sub(1));
    let x2 = (bbox.x2 as usize).clamp(x1 + 1, fw);
    let y2 = (bbox.y2 as usize).clamp(y1 + 1, fh);
    let crop_w = x2 - x1;
    let crop_h = y2 - y1;

    let src = frame.as_ndarray();
    let mut tensor =
        ndarray::Array4::<f32>::zeros((1, 3, EMBED_INPUT_SIZE, EMBED_INPUT_SIZE));

    for y in 0..EMBED_INPUT_SIZE {
        let src_y =
            y1 + (((y as f64 + 0.5) * crop_h as f64 / EMBED_INPUT_SIZE as f64) as usize)
                .min(crop_h - 1);
        for x in 0..EMBED_INPUT_SIZE {
            let src_x = x1
                + (((x as f64 + 0.5) * crop_w as f64 / EMBED_INPUT_SIZE as f64) as usize)
                    .min(crop_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] =
                    (src[[src_y, src_x, c]] as f32 - EMBED_NORM_MEAN) / EMBED_NORM_STD;
            }
        }
    }

    tensor
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] {
                continue;
            }
            let iou = bbox_iou(
                &[dets[i].x1, dets[i].y1, dets[i].x2, dets[i].y2],
                &[dets[j].x1, dets[j].y1, dets[j].x2, dets[j].y2],
            );
            if iou > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}
