use std::path::Path;

/// Copies the original target's audio onto a merged (silent) video,
/// writing the combined result to `dest`. Failure is recoverable: the
/// orchestrator falls back to shipping the silent video.
pub trait AudioRestorer: Send {
    fn restore(
        &self,
        source: &Path,
        merged: &Path,
        dest: &Path,
        fps: f64,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
