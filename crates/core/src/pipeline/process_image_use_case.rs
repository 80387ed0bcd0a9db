use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::run_outcome::RunOutcome;
use crate::policy::domain::content_policy::ContentPolicy;
use crate::processors::domain::frame_processor::{FrameProcessor, ProcessContext};
use crate::selection::reference_store::ReferenceFaceStore;
use crate::shared::run_config::RunConfiguration;
use crate::video::domain::frame_grabber::FrameGrabber;
use crate::video::domain::image_compressor::ImageCompressor;

/// Image pipeline: preflight → copy target to output → processors in
/// place → compression → validate.
pub struct ProcessImageUseCase {
    policy: Box<dyn ContentPolicy>,
    compressor: Box<dyn ImageCompressor>,
    grabber: Box<dyn FrameGrabber>,
    cancelled: Arc<AtomicBool>,
}

impl ProcessImageUseCase {
    pub fn new(
        policy: Box<dyn ContentPolicy>,
        compressor: Box<dyn ImageCompressor>,
        grabber: Box<dyn FrameGrabber>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            policy,
            compressor,
            grabber,
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

        match self.policy.check_image(target) {
            Ok(false) => {}
            Ok(true) => {
                log::error!("content policy violation for {}", target.display());
                return RunOutcome::image_failed("content policy violation");
            }
            Err(e) => {
                log::error!("content check failed: {e}");
                return RunOutcome::image_failed(format!("content check failed: {e}"));
            }
        }

        if let Err(e) = fs::copy(target, &config.output_path) {
            log::error!("could not copy target to output: {e}");
            return RunOutcome::image_failed(format!("could not copy target to output: {e}"));
        }

        for processor in processors.iter_mut() {
            if self.cancelled.load(Ordering::Relaxed) {
                log::warn!("image run aborted");
                return RunOutcome::Aborted;
            }
            if let Err(e) = processor.pre_process(config) {
                log::error!("{} pre-check failed: {e}", processor.name());
                return RunOutcome::image_failed(format!(
                    "{} pre-check failed: {e}",
                    processor.name()
                ));
            }
            log::info!("processing with {}", processor.name());
            let ctx = ProcessContext { config, store };
            if let Err(e) = processor.process_image(&ctx, &config.output_path) {
                log::error!("{} failed: {e}", processor.name());
                return RunOutcome::image_failed(format!("{} failed: {e}", processor.name()));
            }
            if let Err(e) = processor.post_process() {
                log::warn!("{} post-process failed: {e}", processor.name());
            }
        }

        log::info!("compressing image");
        if let Err(e) = self
            .compressor
            .compress(&config.output_path, config.output_image_quality)
        {
            log::error!("compressing image failed: {e}");
        }

        let outcome = match self.grabber.read_image(&config.output_path) {
            Ok(_) => RunOutcome::ImageSucceeded,
            Err(_) => RunOutcome::image_failed("output validation failed"),
        };
        if outcome.is_success() {
            log::info!(
                "processing the image succeeded in {:.2}s",
                start.elapsed().as_secs_f64()
            );
        } else {
            log::error!("processing the image failed");
        }
        outcome
    }
}
