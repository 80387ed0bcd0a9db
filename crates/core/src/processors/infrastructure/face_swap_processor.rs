use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::processors::domain::frame_processor::{FrameProcessor, ProcessContext};
use crate::processors::domain::swap_engine::SwapEngine;
use crate::processors::infrastructure::frame_worker_pool::{frame_index, FrameWorkerPool};
use crate::selection::face_matcher::select_target_faces;
use crate::shared::face::{average_face, Face};
use crate::shared::frame::Frame;
use crate::shared::run_config::RunConfiguration;

pub const NAME: &str = "face_swapper";

/// Replaces the selected faces in every frame with the source identity.
///
/// The source identity is computed once per run from all supplied source
/// images and cached until `post_process`; everything else is stateless
/// between calls. Frame files are mutated in place on disk.
pub struct FaceSwapProcessor {
    analyzer: Arc<dyn FaceAnalyzer>,
    engine: Box<dyn SwapEngine>,
    source_face: Option<Face>,
}

impl FaceSwapProcessor {
    pub fn new(analyzer: Arc<dyn FaceAnalyzer>, engine: Box<dyn SwapEngine>) -> Self {
        Self {
            analyzer,
            engine,
            source_face: None,
        }
    }

    fn swap_frame(
        &self,
        ctx: &ProcessContext<'_>,
        frame: Frame,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let source = self
            .source_face
            .as_ref()
            .ok_or("source identity not prepared")?;
        let faces = self.analyzer.detect_faces(&frame)?;
        let targets = select_target_faces(faces, NAME, ctx.store, ctx.config);

        let mut result = frame;
        for target in &targets {
            result = self.engine.swap(source, target, &result)?;
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
        let swapped = self.swap_frame(ctx, frame)?;
        swapped.save(path)
    }
}

impl FrameProcessor for FaceSwapProcessor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn pre_check(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.engine.prepare()
    }

    fn probe_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// Establishes the source identity: every face found in every source
    /// image, combined into one representative embedding.
    fn pre_process(
        &mut self,
        config: &RunConfiguration,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut faces = Vec::new();
        for path in &config.source_paths {
            let frame = Frame::load(path, 0)?;
            faces.extend(self.analyzer.detect_faces(&frame)?);
        }
        self.source_face =
            Some(average_face(&faces).ok_or("no face detected in source images")?);
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
            let index = frame_index(path);
            self.process_frame_file(ctx, path, index)
                .map_err(|e| e.to_string().into())
        })
    }

    fn post_process(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.source_face = None;
        self.engine.release();
        Ok(())
    }

    fn get_reference_frame(
        &self,
        source_face: &Face,
        target_face: &Face,
        frame: &Frame,
    ) -> Option<Frame> {
        match self.engine.swap(source_face, target_face, frame) {
            Ok(preview) => Some(preview),
            Err(e) => {
                log::debug!("swap preview failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::reference_store::ReferenceFaceStore;
    use crate::shared::face::{BoundingBox, FaceLandmarks};
    use crate::shared::run_config::FaceSelectorMode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    // --- Stubs ---

    struct FixedAnalyzer {
        faces: Vec<Face>,
    }

    impl FaceAnalyzer for FixedAnalyzer {
        fn detect_faces(&self, _frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
            Ok(self.faces.clone())
        }
    }

    /// Paints the whole frame with a fixed value so swapped output is
    /// recognizable on disk.
    struct PaintEngine {
        value: u8,
        ready: bool,
        swaps: Arc<AtomicUsize>,
        released: Arc<Mutex<bool>>,
    }

    impl PaintEngine {
        fn new(value: u8) -> Self {
            Self {
                value,
                ready: false,
                swaps: Arc::new(AtomicUsize::new(0)),
                released: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl SwapEngine for PaintEngine {
        fn prepare(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            self.ready = true;
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn swap(
            &self,
            _source: &Face,
            _target: &Face,
            frame: &Frame,
        ) -> Result<Frame, Box<dyn std::error::Error>> {
            self.swaps.fetch_add(1, Ordering::SeqCst);
            Ok(Frame::new(
                vec![self.value; frame.data().len()],
                frame.width(),
                frame.height(),
                frame.index(),
            ))
        }

        fn release(&mut self) {
            *self.released.lock().unwrap() = true;
        }
    }

    // --- Helpers ---

    fn face(embedding: Vec<f32>) -> Face {
        Face {
            bounding_box: BoundingBox {
                x1: 0.0,
                y1: 0.0,
                x2: 2.0,
                y2: 2.0,
            },
            landmarks: FaceLandmarks::new([(1.0, 1.0); 5]),
            embedding,
            score: 0.9,
            age: None,
            gender: None,
        }
    }

    fn write_frame_files(tmp: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = tmp.path().join(format!("{i:06}.png"));
                Frame::new(vec![10; 4 * 4 * 3], 4, 4, i).save(&path).unwrap();
                path
            })
            .collect()
    }

    fn many_mode_config(tmp: &TempDir) -> RunConfiguration {
        let source = tmp.path().join("source.png");
        Frame::new(vec![20; 4 * 4 * 3], 4, 4, 0).save(&source).unwrap();
        RunConfiguration {
            source_paths: vec![source],
            face_selector_mode: FaceSelectorMode::Many,
            execution_thread_count: 2,
            ..RunConfiguration::default()
        }
    }

    fn processor_with(faces: Vec<Face>, engine: PaintEngine) -> FaceSwapProcessor {
        FaceSwapProcessor::new(Arc::new(FixedAnalyzer { faces }), Box::new(engine))
    }

    // --- Tests ---

    #[test]
    fn test_ready_follows_engine() {
        let mut processor = processor_with(vec![face(vec![1.0, 0.0])], PaintEngine::new(0));
        assert!(!processor.probe_ready());
        processor.pre_check().unwrap();
        assert!(processor.probe_ready());
    }

    #[test]
    fn test_pre_process_without_source_face_fails() {
        let mut processor = processor_with(Vec::new(), PaintEngine::new(0));
        let tmp = TempDir::new().unwrap();
        let config = many_mode_config(&tmp);
        assert!(processor.pre_process(&config).is_err());
    }

    #[test]
    fn test_process_video_rewrites_every_frame() {
        let tmp = TempDir::new().unwrap();
        let config = many_mode_config(&tmp);
        let engine = PaintEngine::new(200);
        let swaps = engine.swaps.clone();

        let mut processor = processor_with(vec![face(vec![1.0, 0.0])], engine);
        processor.pre_check().unwrap();
        processor.pre_process(&config).unwrap();

        let frames = write_frame_files(&tmp, 3);
        let store = ReferenceFaceStore::new();
        let ctx = ProcessContext {
            config: &config,
            store: &store,
        };
        processor.process_video(&ctx, &frames).unwrap();

        assert_eq!(swaps.load(Ordering::SeqCst), 3);
        for path in &frames {
            let frame = Frame::load(path, 0).unwrap();
            assert!(frame.data().iter().all(|&v| v == 200));
        }
    }

    #[test]
    fn test_frame_without_matching_face_is_left_intact() {
        let tmp = TempDir::new().unwrap();
        let config = many_mode_config(&tmp);
        let engine = PaintEngine::new(200);
        let swaps = engine.swaps.clone();

        // Analyzer finds no faces in target frames
        let analyzer = Arc::new(FixedAnalyzer { faces: Vec::new() });
        let mut processor = FaceSwapProcessor::new(analyzer, Box::new(engine));
        processor.pre_check().unwrap();
        // Source face injected directly; the analyzer above is target-side
        processor.source_face = Some(face(vec![1.0, 0.0]));

        let frames = write_frame_files(&tmp, 2);
        let store = ReferenceFaceStore::new();
        let ctx = ProcessContext {
            config: &config,
            store: &store,
        };
        processor.process_video(&ctx, &frames).unwrap();

        assert_eq!(swaps.load(Ordering::SeqCst), 0);
        let frame = Frame::load(&frames[0], 0).unwrap();
        assert!(frame.data().iter().all(|&v| v == 10));
    }

    #[test]
    fn test_process_image_in_place() {
        let tmp = TempDir::new().unwrap();
        let config = many_mode_config(&tmp);
        let mut processor = processor_with(vec![face(vec![1.0, 0.0])], PaintEngine::new(99));
        processor.pre_check().unwrap();
        processor.pre_process(&config).unwrap();

        let output = tmp.path().join("output.png");
        Frame::new(vec![10; 4 * 4 * 3], 4, 4, 0).save(&output).unwrap();

        let store = ReferenceFaceStore::new();
        let ctx = ProcessContext {
            config: &config,
            store: &store,
        };
        processor.process_image(&ctx, &output).unwrap();

        let frame = Frame::load(&output, 0).unwrap();
        assert!(frame.data().iter().all(|&v| v == 99));
    }

    #[test]
    fn test_post_process_releases_engine_and_cache() {
        let tmp = TempDir::new().unwrap();
        let config = many_mode_config(&tmp);
        let engine = PaintEngine::new(0);
        let released = engine.released.clone();

        let mut processor = processor_with(vec![face(vec![1.0, 0.0])], engine);
        processor.pre_check().unwrap();
        processor.pre_process(&config).unwrap();
        assert!(processor.source_face.is_some());

        processor.post_process().unwrap();
        assert!(processor.source_face.is_none());
        assert!(*released.lock().unwrap());
    }

    #[test]
    fn test_reference_frame_preview_is_swapped() {
        let processor = processor_with(vec![face(vec![1.0, 0.0])], {
            let mut engine = PaintEngine::new(77);
            engine.ready = true;
            engine
        });
        let frame = Frame::new(vec![0; 12], 2, 2, 0);
        let preview = processor
            .get_reference_frame(&face(vec![1.0, 0.0]), &face(vec![0.0, 1.0]), &frame)
            .unwrap();
        assert!(preview.data().iter().all(|&v| v == 77));
    }

}
