use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::run_outcome::RunOutcome;
use crate::policy::domain::content_policy::ContentPolicy;
use crate::processors::domain::frame_processor::{FrameProcessor, ProcessContext};
use crate::selection::reference_store::ReferenceFaceStore;
use crate::shared::run_config::RunConfiguration;
use crate::video::domain::audio_restorer::AudioRestorer;
use crate::video::domain::frame_extractor::FrameExtractor;
use crate::video::domain::frame_grabber::FrameGrabber;
use crate::video::domain::video_merger::VideoMerger;
use crate::workspace::temp_workspace::TempWorkspace;

/// Video pipeline:
/// preflight → clear/create workspace → extract → processors (in order)
/// → merge → audio → cleanup → validate.
///
/// Stages run strictly sequentially. Merge failure is reported but the
/// run still attempts audio handling against whatever partial output
/// exists; validation alone decides success. Every exit path clears the
/// workspace unless retention was requested.
pub struct ProcessVideoUseCase {
    policy: Box<dyn ContentPolicy>,
    extractor: Box<dyn FrameExtractor>,
    merger: Box<dyn VideoMerger>,
    audio_restorer: Box<dyn AudioRestorer>,
    grabber: Box<dyn FrameGrabber>,
    workspace: TempWorkspace,
    cancelled: Arc<AtomicBool>,
}

impl ProcessVideoUseCase {
    pub fn new(
        policy: Box<dyn ContentPolicy>,
        extractor: Box<dyn FrameExtractor>,
        merger: Box<dyn VideoMerger>,
        audio_restorer: Box<dyn AudioRestorer>,
        grabber: Box<dyn FrameGrabber>,
        workspace: TempWorkspace,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            policy,
            extractor,
            merger,
            audio_restorer,
            grabber,
            workspace,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &self,
        config: &RunConfiguration,
        store: &ReferenceFaceStore,
        processors: &mut [Box<dyn FrameProcessor>],
    ) -> RunOutcome {
        let start = Instant::now();
        let target = &config.target_path;

        // Preflight: content policy gates everything, with no side
        // effects beyond the check itself.
        match self
            .policy
            .check_video(target, config.trim_frame_start, config.trim_frame_end)
        {
            Ok(false) => {}
            Ok(true) => {
                log::error!("content policy violation for {}", target.display());
                return RunOutcome::video_failed("content policy violation");
            }
            Err(e) => {
                log::error!("content check failed: {e}");
                return RunOutcome::video_failed(format!("content check failed: {e}"));
            }
        }

        let metadata = match self.grabber.probe(target) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::error!("could not probe target video: {e}");
                return RunOutcome::video_failed(format!("could not probe target video: {e}"));
            }
        };
        let resolution = config.output_resolution.unwrap_or_else(|| metadata.resolution());
        let fps = config.output_fps.unwrap_or(metadata.fps);

        if self.is_cancelled() {
            return self.abort(config);
        }

        log::info!("clearing temporary workspace");
        if let Err(e) = self.workspace.clear(target) {
            log::warn!("could not clear stale workspace: {e}");
        }
        log::info!("creating temporary workspace");
        if let Err(e) = self.workspace.create(target) {
            log::error!("could not create workspace: {e}");
            return RunOutcome::video_failed(format!("could not create workspace: {e}"));
        }

        log::info!("extracting frames at {fps:.2} fps");
        let frames_dir = self.workspace.dir(target);
        if let Err(e) = self
            .extractor
            .extract(target, &frames_dir, resolution, fps, config)
        {
            log::error!("frame extraction failed: {e}");
            return self.finish(
                config,
                RunOutcome::video_failed(format!("frame extraction failed: {e}")),
            );
        }

        let frame_paths = match self.workspace.list_frames(target) {
            Ok(paths) => paths,
            Err(e) => {
                log::error!("could not list extracted frames: {e}");
                return self.finish(
                    config,
                    RunOutcome::video_failed(format!("could not list extracted frames: {e}")),
                );
            }
        };
        if frame_paths.is_empty() {
            log::error!("no frames produced");
            return self.finish(config, RunOutcome::video_failed("no frames produced"));
        }

        for processor in processors.iter_mut() {
            if self.is_cancelled() {
                return self.abort(config);
            }
            if let Err(e) = processor.pre_process(config) {
                log::error!("{} pre-check failed: {e}", processor.name());
                return self.finish(
                    config,
                    RunOutcome::video_failed(format!(
                        "{} pre-check failed: {e}",
                        processor.name()
                    )),
                );
            }
            log::info!("processing with {}", processor.name());
            let ctx = ProcessContext { config, store };
            if let Err(e) = processor.process_video(&ctx, &frame_paths) {
                log::error!("{} failed: {e}", processor.name());
                return self.finish(
                    config,
                    RunOutcome::video_failed(format!("{} failed: {e}", processor.name())),
                );
            }
            if let Err(e) = processor.post_process() {
                log::warn!("{} post-process failed: {e}", processor.name());
            }
        }

        if self.is_cancelled() {
            return self.abort(config);
        }

        // Merge failure is surfaced but does not abort: audio handling
        // still runs against whatever exists, and validation decides.
        log::info!("merging video at {fps:.2} fps");
        let merged = self.workspace.temp_output_path(target);
        if let Err(e) = self.merger.merge(
            &frame_paths,
            fps,
            resolution,
            &merged,
            config.output_video_quality,
        ) {
            log::error!("merging video failed: {e}");
        }

        if config.skip_audio {
            log::info!("skipping audio");
            self.ship_silent(config);
        } else {
            log::info!("restoring audio");
            if let Err(e) = self
                .audio_restorer
                .restore(target, &merged, &config.output_path, fps)
            {
                log::warn!("restoring audio failed, keeping silent video: {e}");
                self.ship_silent(config);
            }
        }

        // Cleanup always runs before the final validation
        self.cleanup(config);
        let outcome = self.validate(config);
        if outcome.is_success() {
            log::info!(
                "processing the video succeeded in {:.2}s",
                start.elapsed().as_secs_f64()
            );
        } else {
            log::error!("processing the video failed");
        }
        outcome
    }

    /// Fallback path: the muted merged video becomes the final output.
    fn ship_silent(&self, config: &RunConfiguration) {
        if let Err(e) = self
            .workspace
            .move_output(&config.target_path, &config.output_path)
        {
            log::error!("could not move output into place: {e}");
        }
    }

    /// Sole source of the final success signal, decoupled from stage
    /// warnings: the output must probe as a well-formed video.
    fn validate(&self, config: &RunConfiguration) -> RunOutcome {
        match self.grabber.probe(&config.output_path) {
            Ok(metadata) if metadata.total_frames > 0 => RunOutcome::VideoSucceeded,
            Ok(_) | Err(_) => RunOutcome::video_failed("output validation failed"),
        }
    }

    fn cleanup(&self, config: &RunConfiguration) {
        if config.keep_temp {
            log::debug!("retaining temporary workspace");
        } else {
            log::info!("clearing temporary workspace");
            if let Err(e) = self.workspace.clear(&config.target_path) {
                log::warn!("could not clear workspace: {e}");
            }
        }
    }

    fn finish(&self, config: &RunConfiguration, outcome: RunOutcome) -> RunOutcome {
        self.cleanup(config);
        outcome
    }

    fn abort(&self, config: &RunConfiguration) -> RunOutcome {
        log::warn!("video run aborted");
        self.finish(config, RunOutcome::Aborted)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
