use std::path::{Path, PathBuf};

/// Reassembles processed frame files into a video at the configured
/// frame rate and quality. The result carries no audio; restoration
/// happens in a separate step.
pub trait VideoMerger: Send {
    fn merge(
        &self,
        frame_paths: &[PathBuf],
        fps: f64,
        resolution: (u32, u32),
        dest: &Path,
        quality: u8,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
