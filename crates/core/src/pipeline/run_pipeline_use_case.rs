use thiserror::Error;

use crate::pipeline::process_image_use_case::ProcessImageUseCase;
use crate::pipeline::process_video_use_case::ProcessVideoUseCase;
use crate::pipeline::readiness_gate::ReadinessGate;
use crate::pipeline::run_outcome::RunOutcome;
use crate::processors::domain::frame_processor::FrameProcessor;
use crate::selection::reference_resolver::ReferenceResolver;
use crate::selection::reference_store::ReferenceFaceStore;
use crate::shared::run_config::{ConfigError, RunConfiguration};

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("frame processor '{name}' failed pre-check: {reason}")]
    ProcessorPreCheck { name: String, reason: String },
}

/// Top-level orchestrator for one run.
///
/// Order is fixed: validate configuration → processor pre-checks →
/// readiness gate over every processor → reference resolution against a
/// fresh run-scoped store → dispatch to the image or video pipeline.
/// The store never outlives the run.
pub struct RunPipelineUseCase {
    processors: Vec<Box<dyn FrameProcessor>>,
    gate: ReadinessGate,
    resolver: ReferenceResolver,
    image: ProcessImageUseCase,
    video: ProcessVideoUseCase,
}

impl RunPipelineUseCase {
    pub fn new(
        processors: Vec<Box<dyn FrameProcessor>>,
        gate: ReadinessGate,
        resolver: ReferenceResolver,
        image: ProcessImageUseCase,
        video: ProcessVideoUseCase,
    ) -> Self {
        Self {
            processors,
            gate,
            resolver,
            image,
            video,
        }
    }

    pub fn run(&mut self, config: &RunConfiguration) -> Result<RunOutcome, RunError> {
        config.validate()?;

        for processor in &mut self.processors {
            processor
                .pre_check()
                .map_err(|e| RunError::ProcessorPreCheck {
                    name: processor.name().to_string(),
                    reason: e.to_string(),
                })?;
        }

        for processor in &self.processors {
            self.gate.await_ready(processor.as_ref());
        }

        let mut store = ReferenceFaceStore::new();
        self.resolver.resolve(config, &mut store, &self.processors);

        let outcome = if config.is_image_target() {
            self.image.execute(config, &store, &mut self.processors)
        } else {
            self.video.execute(config, &store, &mut self.processors)
        };
        log::info!("{outcome}");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::face_analyzer::FaceAnalyzer;
    use crate::pipeline::readiness_gate::Clock;
    use crate::policy::domain::content_policy::ContentPolicy;
    use crate::processors::domain::frame_processor::ProcessContext;
    use crate::selection::reference_store::ORIGIN;
    use crate::shared::face::{BoundingBox, Face, FaceLandmarks};
    use crate::shared::frame::Frame;
    use crate::shared::run_config::FaceSelectorMode;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::audio_restorer::AudioRestorer;
    use crate::video::domain::frame_extractor::FrameExtractor;
    use crate::video::domain::frame_grabber::FrameGrabber;
    use crate::video::domain::image_compressor::ImageCompressor;
    use crate::video::domain::video_merger::VideoMerger;
    use crate::workspace::temp_workspace::TempWorkspace;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    // Frames are tagged by their first byte: targets below 50, sources
    // in 100..150, processor previews at 200 and above.
    const TARGET_TAG: u8 = 10;
    const SOURCE_TAG: u8 = 120;
    const PREVIEW_TAG: u8 = 220;

    fn tagged_frame(tag: u8) -> Frame {
        let mut data = vec![0u8; 12];
        data[0] = tag;
        Frame::new(data, 2, 2, 0)
    }

    fn face(embedding: Vec<f32>) -> Face {
        Face {
            bounding_box: BoundingBox {
                x1: 0.0,
                y1: 0.0,
                x2: 10.0,
                y2: 10.0,
            },
            landmarks: FaceLandmarks::new([(0.0, 0.0); 5]),
            embedding,
            score: 0.9,
            age: None,
            gender: None,
        }
    }

    // --- Stubs ---

    struct TagAnalyzer;

    impl FaceAnalyzer for TagAnalyzer {
        fn detect_faces(&self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
            Ok(match frame.data()[0] {
                0..=49 => vec![face(vec![0.0, 1.0])],
                100..=149 => vec![face(vec![1.0, 0.0])],
                200..=255 => vec![face(vec![0.6, 0.8])],
                _ => Vec::new(),
            })
        }
    }

    struct StubGrabber;

    impl FrameGrabber for StubGrabber {
        fn read_image(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if name.starts_with("source") {
                Ok(tagged_frame(SOURCE_TAG))
            } else if path.exists() {
                Ok(tagged_frame(TARGET_TAG))
            } else {
                Err("missing".into())
            }
        }

        fn grab_frame(
            &self,
            _video: &Path,
            _index: usize,
        ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            Ok(Some(tagged_frame(TARGET_TAG)))
        }

        fn probe(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if !path.exists() {
                return Err("missing".into());
            }
            Ok(VideoMetadata {
                width: 320,
                height: 240,
                fps: 30.0,
                total_frames: 3,
                codec: "h264".to_string(),
                source_path: Some(path.to_path_buf()),
            })
        }
    }

    struct PermissiveStubPolicy;

    impl ContentPolicy for PermissiveStubPolicy {
        fn check_image(&self, _path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
            Ok(false)
        }

        fn check_video(
            &self,
            _path: &Path,
            _trim_start: Option<usize>,
            _trim_end: Option<usize>,
        ) -> Result<bool, Box<dyn std::error::Error>> {
            Ok(false)
        }
    }

    struct StubExtractor;

    impl FrameExtractor for StubExtractor {
        fn extract(
            &self,
            _target: &Path,
            frames_dir: &Path,
            _resolution: (u32, u32),
            _fps: f64,
            _config: &RunConfiguration,
        ) -> Result<usize, Box<dyn std::error::Error>> {
            for index in 0..3 {
                fs::write(frames_dir.join(format!("{index:06}.jpg")), b"frame")?;
            }
            Ok(3)
        }
    }

    struct StubMerger {
        calls: Arc<Mutex<Vec<f64>>>,
    }

    impl VideoMerger for StubMerger {
        fn merge(
            &self,
            _frame_paths: &[PathBuf],
            fps: f64,
            _resolution: (u32, u32),
            dest: &Path,
            _quality: u8,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(fps);
            fs::write(dest, b"merged")?;
            Ok(())
        }
    }

    struct StubRestorer;

    impl AudioRestorer for StubRestorer {
        fn restore(
            &self,
            _source: &Path,
            merged: &Path,
            dest: &Path,
            _fps: f64,
        ) -> Result<(), Box<dyn std::error::Error>> {
            fs::copy(merged, dest)?;
            Ok(())
        }
    }

    struct StubCompressor;

    impl ImageCompressor for StubCompressor {
        fn compress(&self, _path: &Path, _quality: u8) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    struct InstantClock;

    impl Clock for InstantClock {
        fn sleep(&self, _duration: Duration) {}
    }

    /// Snapshot of the reference store taken while a processor stage runs.
    #[derive(Clone, Debug, PartialEq)]
    struct StoreSnapshot {
        len: usize,
        has_origin: bool,
        has_swapper_key: bool,
        frames: usize,
    }

    struct SnapshotProcessor {
        name: &'static str,
        preview: bool,
        fail_pre_check: bool,
        snapshots: Arc<Mutex<Vec<StoreSnapshot>>>,
    }

    impl SnapshotProcessor {
        fn new(name: &'static str, preview: bool) -> Self {
            Self {
                name,
                preview,
                fail_pre_check: false,
                snapshots: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FrameProcessor for SnapshotProcessor {
        fn name(&self) -> &'static str {
            self.name
        }

        fn pre_check(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail_pre_check {
                return Err("weights unavailable".into());
            }
            Ok(())
        }

        fn probe_ready(&self) -> bool {
            true
        }

        fn pre_process(
            &mut self,
            _config: &RunConfiguration,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn process_image(
            &mut self,
            ctx: &ProcessContext<'_>,
            _image_path: &Path,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.snapshot(ctx, 1);
            Ok(())
        }

        fn process_video(
            &mut self,
            ctx: &ProcessContext<'_>,
            frame_paths: &[PathBuf],
        ) -> Result<(), Box<dyn std::error::Error>> {
            for path in frame_paths {
                // Mutate each frame file in place, as a real stage would
                fs::write(path, b"processed")?;
            }
            self.snapshot(ctx, frame_paths.len());
            Ok(())
        }

        fn post_process(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn get_reference_frame(
            &self,
            _source_face: &Face,
            _target_face: &Face,
            _frame: &Frame,
        ) -> Option<Frame> {
            self.preview.then(|| tagged_frame(PREVIEW_TAG))
        }
    }

    impl SnapshotProcessor {
        fn snapshot(&self, ctx: &ProcessContext<'_>, frames: usize) {
            self.snapshots.lock().unwrap().push(StoreSnapshot {
                len: ctx.store.len(),
                has_origin: ctx.store.origin().is_some(),
                has_swapper_key: ctx.store.get("face_swapper").is_some(),
                frames,
            });
        }
    }

    // --- Helpers ---

    struct Fixture {
        tmp: TempDir,
        config: RunConfiguration,
        workspace: TempWorkspace,
        merge_calls: Arc<Mutex<Vec<f64>>>,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target.mp4");
        fs::write(&target, b"video").unwrap();
        let source = tmp.path().join("source.png");
        fs::write(&source, b"image").unwrap();
        let config = RunConfiguration {
            source_paths: vec![source],
            target_path: target,
            output_path: tmp.path().join("out.mp4"),
            processor_names: vec!["face_swapper".to_string()],
            face_selector_mode: FaceSelectorMode::Reference,
            ..RunConfiguration::default()
        };
        let workspace = TempWorkspace::with_root(tmp.path().join("scratch"));
        Fixture {
            tmp,
            config,
            workspace,
            merge_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn pipeline(fx: &Fixture, processors: Vec<Box<dyn FrameProcessor>>) -> RunPipelineUseCase {
        let analyzer = Arc::new(TagAnalyzer);
        RunPipelineUseCase::new(
            processors,
            ReadinessGate::with_clock(Box::new(InstantClock), Duration::from_millis(500)),
            ReferenceResolver::new(analyzer, Box::new(StubGrabber)),
            ProcessImageUseCase::new(
                Box::new(PermissiveStubPolicy),
                Box::new(StubCompressor),
                Box::new(StubGrabber),
                None,
            ),
            ProcessVideoUseCase::new(
                Box::new(PermissiveStubPolicy),
                Box::new(StubExtractor),
                Box::new(StubMerger {
                    calls: fx.merge_calls.clone(),
                }),
                Box::new(StubRestorer),
                Box::new(StubGrabber),
                fx.workspace.clone(),
                None,
            ),
        )
    }

    // --- Tests ---

    #[test]
    fn test_end_to_end_single_processor_reference_run() {
        // Source: one face image. Target: 3-frame video with a
        // consistent face. Mode: reference. One processor whose preview
        // is empty.
        let fx = fixture();
        let processor = SnapshotProcessor::new("face_swapper", false);
        let snapshots = processor.snapshots.clone();

        let mut pipeline = pipeline(&fx, vec![Box::new(processor)]);
        let outcome = pipeline.run(&fx.config).unwrap();

        assert_eq!(outcome, RunOutcome::VideoSucceeded);
        // The store held exactly one key ("origin") during processing,
        // and all 3 frames were handed to the stage.
        assert_eq!(
            *snapshots.lock().unwrap(),
            vec![StoreSnapshot {
                len: 1,
                has_origin: true,
                has_swapper_key: false,
                frames: 3,
            }]
        );
        // Merge ran once at the probed fps, and the output validates
        assert_eq!(*fx.merge_calls.lock().unwrap(), vec![30.0]);
        assert!(fx.config.output_path.exists());
        assert!(!fx.workspace.exists(&fx.config.target_path));
    }

    #[test]
    fn test_end_to_end_two_processors_chained_reference() {
        // First processor produces a non-empty preview: the store must
        // contain both "origin" and the first processor's key before the
        // second processor runs.
        let fx = fixture();
        let first = SnapshotProcessor::new("face_swapper", true);
        let second = SnapshotProcessor::new("face_enhancer", false);
        let second_snapshots = second.snapshots.clone();

        let mut pipeline = pipeline(&fx, vec![Box::new(first), Box::new(second)]);
        let outcome = pipeline.run(&fx.config).unwrap();

        assert_eq!(outcome, RunOutcome::VideoSucceeded);
        assert_eq!(
            *second_snapshots.lock().unwrap(),
            vec![StoreSnapshot {
                len: 2,
                has_origin: true,
                has_swapper_key: true,
                frames: 3,
            }]
        );
    }

    #[test]
    fn test_image_target_dispatches_to_image_path() {
        let fx = fixture();
        let mut config = fx.config.clone();
        let target = fx.tmp.path().join("portrait.png");
        fs::write(&target, b"image").unwrap();
        config.target_path = target;
        config.output_path = fx.tmp.path().join("out.png");

        let processor = SnapshotProcessor::new("face_swapper", false);
        let snapshots = processor.snapshots.clone();

        let mut pipeline = pipeline(&fx, vec![Box::new(processor)]);
        let outcome = pipeline.run(&config).unwrap();

        assert_eq!(outcome, RunOutcome::ImageSucceeded);
        // Image path: one "frame", origin resolved from the target image
        assert_eq!(
            *snapshots.lock().unwrap(),
            vec![StoreSnapshot {
                len: 1,
                has_origin: true,
                has_swapper_key: false,
                frames: 1,
            }]
        );
        // No video merge on the image path
        assert!(fx.merge_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_is_fatal_before_any_run() {
        let fx = fixture();
        let mut config = fx.config.clone();
        config.processor_names.clear();

        let mut pipeline = pipeline(&fx, vec![]);
        let err = pipeline.run(&config).unwrap_err();
        assert!(matches!(
            err,
            RunError::Config(ConfigError::EmptyProcessorChain)
        ));
    }

    #[test]
    fn test_processor_pre_check_failure_is_fatal() {
        let fx = fixture();
        let mut processor = SnapshotProcessor::new("face_swapper", false);
        processor.fail_pre_check = true;
        let snapshots = processor.snapshots.clone();

        let mut pipeline = pipeline(&fx, vec![Box::new(processor)]);
        let err = pipeline.run(&fx.config).unwrap_err();

        assert!(matches!(
            err,
            RunError::ProcessorPreCheck { ref name, .. } if name == "face_swapper"
        ));
        // No stage ever ran
        assert!(snapshots.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_reference_mode_skips_resolution() {
        let fx = fixture();
        let mut config = fx.config.clone();
        config.face_selector_mode = FaceSelectorMode::Many;

        let processor = SnapshotProcessor::new("face_swapper", false);
        let snapshots = processor.snapshots.clone();

        let mut pipeline = pipeline(&fx, vec![Box::new(processor)]);
        let outcome = pipeline.run(&config).unwrap();

        assert_eq!(outcome, RunOutcome::VideoSucceeded);
        assert_eq!(
            *snapshots.lock().unwrap(),
            vec![StoreSnapshot {
                len: 0,
                has_origin: false,
                has_swapper_key: false,
                frames: 3,
            }]
        );
    }

    #[test]
    fn test_origin_constant_matches_store_sentinel() {
        assert_eq!(ORIGIN, "origin");
    }
}
