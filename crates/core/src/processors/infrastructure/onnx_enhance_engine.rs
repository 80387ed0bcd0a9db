/// Face-restoration engine backed by an ONNX GFPGAN-style model.
///
/// Crops are normalized to [-1, 1], enhanced at 512×512, and pasted back.
/// Same lifecycle as the swap engine: weights during `prepare`, lazy
/// session, dropped on `release`.
use std::path::PathBuf;
use std::sync::Mutex;

use crate::processors::domain::enhance_engine::EnhanceEngine;
use crate::processors::infrastructure::face_crop::{crop_rect, crop_to_tensor, paste_tensor};
use crate::shared::constants::{ENHANCE_MODEL_NAME, ENHANCE_MODEL_URL};
use crate::shared::face::Face;
use crate::shared::frame::Frame;
use crate::shared::model_resolver;

const INPUT_SIZE: usize = 512;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;
const CROP_MARGIN: f64 = 0.25;

pub struct OnnxEnhanceEngine {
    model_path: Option<PathBuf>,
    session: Mutex<Option<ort::session::Session>>,
    progress: Option<fn(u64, u64)>,
}

impl OnnxEnhanceEngine {
    pub fn new(progress: Option<fn(u64, u64)>) -> Self {
        Self {
            model_path: model_resolver::cached(ENHANCE_MODEL_NAME),
            session: Mutex::new(None),
            progress,
        }
    }
}

impl EnhanceEngine for OnnxEnhanceEngine {
    fn prepare(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let path = model_resolver::resolve(
            ENHANCE_MODEL_NAME,
            ENHANCE_MODEL_URL,
            self.progress.map(|f| Box::new(f) as model_resolver::ProgressFn),
        )?;
        self.model_path = Some(path);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.model_path.as_deref().is_some_and(|p| p.exists())
    }

    fn enhance(
        &self,
        target: &Face,
        frame: &Frame,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let model_path = self
            .model_path
            .as_deref()
            .ok_or("enhance engine not prepared")?;

        let Some(rect) = crop_rect(
            &target.bounding_box,
            frame.width(),
            frame.height(),
            CROP_MARGIN,
        ) else {
            return Ok(frame.clone());
        };

        let crop = crop_to_tensor(frame, &rect, INPUT_SIZE, NORM_MEAN, NORM_STD);
        let crop_value = ort::value::Tensor::from_array(crop)?;

        let mut guard = self
            .session
            .lock()
            .map_err(|e| format!("lock poisoned: {e}"))?;
        if guard.is_none() {
            *guard = Some(
                ort::session::Session::builder()?
                    .with_optimization_level(
                        ort::session::builder::GraphOptimizationLevel::Level3,
                    )?
                    .commit_from_file(model_path)?,
            );
        }
        let session = guard.as_mut().expect("session initialized above");

        let outputs = session.run(ort::inputs![crop_value])?;
        let enhanced = outputs[0].try_extract_array::<f32>()?;

        let mut result = frame.clone();
        paste_tensor(&mut result, &rect, &enhanced, NORM_MEAN, NORM_STD);
        Ok(result)
    }

    fn release(&mut self) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = None;
        }
    }
}
