use std::path::Path;

use crate::policy::domain::content_policy::ContentPolicy;

/// Pass-through policy used when no analyser is configured.
pub struct PermissivePolicy;

impl ContentPolicy for PermissivePolicy {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_violates() {
        let policy = PermissivePolicy;
        assert!(!policy.check_image(Path::new("a.png")).unwrap());
        assert!(!policy
            .check_video(Path::new("a.mp4"), Some(0), Some(100))
            .unwrap());
    }
}
