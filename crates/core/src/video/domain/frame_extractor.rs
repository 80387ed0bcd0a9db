use std::path::Path;

use crate::shared::run_config::RunConfiguration;

/// Frame-extraction collaborator: decodes the target at the requested
/// resolution/fps and writes an ordered sequence of frame files into the
/// workspace directory. Returns the number of frames written.
pub trait FrameExtractor: Send {
    fn extract(
        &self,
        target: &Path,
        frames_dir: &Path,
        resolution: (u32, u32),
        fps: f64,
        config: &RunConfiguration,
    ) -> Result<usize, Box<dyn std::error::Error>>;
}
