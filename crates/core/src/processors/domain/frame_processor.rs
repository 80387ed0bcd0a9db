use std::path::{Path, PathBuf};

use crate::selection::reference_store::ReferenceFaceStore;
use crate::shared::face::Face;
use crate::shared::frame::Frame;
use crate::shared::run_config::RunConfiguration;

/// Per-run state handed to every frame-processing call.
///
/// The reference store is scoped to one run and injected here rather than
/// living in process-global state.
pub struct ProcessContext<'a> {
    pub config: &'a RunConfiguration,
    pub store: &'a ReferenceFaceStore,
}

/// A pluggable transformation stage applied to every frame of a run.
///
/// The orchestrator never inspects a processor's internals; it drives this
/// fixed contract in order: `pre_check` during preflight, `probe_ready`
/// from the readiness gate, `pre_process` before the stage runs,
/// `process_image`/`process_video` for the work, `post_process` to release
/// resources afterwards. Implementations are stateless between calls
/// except for lazily-loaded backing resources they manage themselves.
pub trait FrameProcessor: Send {
    fn name(&self) -> &'static str;

    /// Resolves backing resources (e.g. starts a model download). Failure
    /// is fatal before any run starts.
    fn pre_check(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// Non-blocking probe of whether backing resources are loaded and
    /// usable. The readiness gate polls solely on this signal.
    fn probe_ready(&self) -> bool;

    /// Per-run preparation; failure fails the whole run before any frames
    /// are touched.
    fn pre_process(&mut self, config: &RunConfiguration)
        -> Result<(), Box<dyn std::error::Error>>;

    /// Transforms the single output file in place.
    fn process_image(
        &mut self,
        ctx: &ProcessContext<'_>,
        image_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Streams over the full ordered frame sequence, mutating frame files
    /// in place on disk.
    fn process_video(
        &mut self,
        ctx: &ProcessContext<'_>,
        frame_paths: &[PathBuf],
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Resource release after the stage completes.
    fn post_process(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// A processor-specific preview of the output for a single frame,
    /// used during reference resolution so later stages can match against
    /// an identity that accounts for this stage's transformation.
    /// `None` when the processor has no meaningful preview.
    fn get_reference_frame(
        &self,
        source_face: &Face,
        target_face: &Face,
        frame: &Frame,
    ) -> Option<Frame>;
}
