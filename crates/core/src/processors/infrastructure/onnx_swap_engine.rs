/// Identity-swap engine backed by an ONNX inswapper-style model.
///
/// The model takes a normalized face crop plus the source identity
/// embedding and returns the swapped crop, which is pasted back into the
/// frame. Weights resolve during `prepare`; the session loads lazily on
/// the first swap and is dropped on `release`.
use std::path::PathBuf;
use std::sync::Mutex;

use crate::processors::domain::swap_engine::SwapEngine;
use crate::processors::infrastructure::face_crop::{crop_rect, crop_to_tensor, paste_tensor};
use crate::shared::constants::{SWAP_MODEL_NAME, SWAP_MODEL_URL};
use crate::shared::face::Face;
use crate::shared::frame::Frame;
use crate::shared::model_resolver;

const INPUT_SIZE: usize = 128;

/// Fraction of the face box added around the crop so the model sees
/// context beyond the tight detection box.
const CROP_MARGIN: f64 = 0.25;

pub struct OnnxSwapEngine {
    model_path: Option<PathBuf>,
    session: Mutex<Option<ort::session::Session>>,
    progress: Option<fn(u64, u64)>,
}

impl OnnxSwapEngine {
    pub fn new(progress: Option<fn(u64, u64)>) -> Self {
        Self {
            model_path: model_resolver::cached(SWAP_MODEL_NAME),
            session: Mutex::new(None),
            progress,
        }
    }
}

impl SwapEngine for OnnxSwapEngine {
    fn prepare(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let path = model_resolver::resolve(
            SWAP_MODEL_NAME,
            SWAP_MODEL_URL,
            self.progress.map(|f| Box::new(f) as model_resolver::ProgressFn),
        )?;
        self.model_path = Some(path);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.model_path.as_deref().is_some_and(|p| p.exists())
    }

    fn swap(
        &self,
        source: &Face,
        target: &Face,
        frame: &Frame,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let model_path = self
            .model_path
            .as_deref()
            .ok_or("swap engine not prepared")?;

        let Some(rect) = crop_rect(
            &target.bounding_box,
            frame.width(),
            frame.height(),
            CROP_MARGIN,
        ) else {
            // Face entirely outside the frame: nothing to swap
            return Ok(frame.clone());
        };

        let crop = crop_to_tensor(frame, &rect, INPUT_SIZE, 0.0, 255.0);
        let embedding = ndarray::Array2::from_shape_vec(
            (1, source.embedding.len()),
            source.embedding.clone(),
        )?;

        let crop_value = ort::value::Tensor::from_array(crop)?;
        let embedding_value = ort::value::Tensor::from_array(embedding)?;

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

        let outputs = session.run(ort::inputs![crop_value, embedding_value])?;
        let swapped = outputs[0].try_extract_array::<f32>()?;

        let mut result = frame.clone();
        paste_tensor(&mut result, &rect, &swapped, 0.0, 255.0);
        Ok(result)
    }

    fn release(&mut self) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = None;
        }
    }
}
