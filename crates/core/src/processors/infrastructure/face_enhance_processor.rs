use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::processors::domain::enhance_engine::EnhanceEngine;
use crate::processors::domain::frame_processor::{FrameProcessor, ProcessContext};
use crate::processors::infrastructure::frame_worker_pool::{frame_index, FrameWorkerPool};
use crate::selection::face_matcher::select_target_faces;
use crate::shared::face::Face;
use crate::shared::frame::Frame;
use crate::shared::run_config::RunConfiguration;

pub const NAME: &str = "face_enhancer";

/// Restores detail on the selected faces in every frame.
///
/// Runs after the swapper in a typical chain, matching against the
/// post-swap identity stored under the swapper's key (or origin).
pub struct FaceEnhanceProcessor {
    analyzer: Arc<dyn FaceAnalyzer>,
    engine: Box<dyn EnhanceEngine>,
}

impl FaceEnhanceProcessor {
    pub fn new(analyzer: Arc<dyn FaceAnalyzer>, engine: Box<dyn EnhanceEngine>) -> Self {
        Self { analyzer, engine }
    }

    fn enhance_frame(
        &self,
        ctx: &ProcessContext<'_>,
        frame: Frame,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let faces = self.analyzer.detect_faces(&frame)?;
        let targets = select_target_faces(faces, NAME, ctx.store, ctx.config);

        let mut result = frame;
        for target in &targets {
            result = self.engine.enhance(target, &result)?;
        }
        Ok(result)
    }

    fn process_frame_file(
        &self,
        ctx: &ProcessContext<'_>,
        path: &Path,
        index: usize,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let frame = Frame::load(path, index)?;
        let enhanced = self.enhance_frame(ctx, frame)?;
        enhanced.save(path)
    }
}

impl FrameProcessor for FaceEnhanceProcessor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn pre_check(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.engine.prepare()
    }

    fn probe_ready(&self) -> bool {
        self.engine.is_ready()
    }

    fn pre_process(
        &mut self,
        _config: &RunConfiguration,
    ) -> Result<(), Box<dyn std::error::Error>> {
        // Enhancement needs no source identity
        Ok(())
    }

    fn process_image(
        &mut self,
        ctx: &ProcessContext<'_>,
        image_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.process_frame_file(ctx, image_path, 0)
    }

    fn process_video(
        &mut self,
        ctx: &ProcessContext<'_>,
        frame_paths: &[PathBuf],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let pool = FrameWorkerPool::new(
            ctx.config.execution_thread_count,
            ctx.config.execution_queue_count,
        );
        pool.run(frame_paths, &|path| {
            self.process_frame_file(ctx, path, frame_index(path))
                .map_err(|e| e.to_string().into())
        })
    }

    fn post_process(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.engine.release();
        Ok(())
    }

    /// Enhancement barely moves face geometry; later stages can keep
    /// matching against the incoming reference.
    fn get_reference_frame(
        &self,
        _source_face: &Face,
        _target_face: &Face,
        _frame: &Frame,
    ) -> Option<Frame> {
        None
    }
}
