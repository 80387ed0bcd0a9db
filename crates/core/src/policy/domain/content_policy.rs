use std::path::Path;

/// Content-policy collaborator gating the preflight check.
///
/// Returns whether the asset violates policy; a failing check
/// short-circuits the run before any processing begins.
pub trait ContentPolicy: Send {
    fn check_image(&self, path: &Path) -> Result<bool, Box<dyn std::error::Error>>;

    fn check_video(
        &self,
        path: &Path,
        trim_start: Option<usize>,
        trim_end: Option<usize>,
    ) -> Result<bool, Box<dyn std::error::Error>>;
}
