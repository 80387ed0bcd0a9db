use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Read-side media collaborator: decodes single frames and probes
/// metadata. Consumed by reference resolution and by output validation.
pub trait FrameGrabber: Send {
    /// Decodes an image file into a frame.
    fn read_image(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Decodes the frame at `index` from a video, or `None` when the
    /// video is shorter.
    fn grab_frame(
        &self,
        video: &Path,
        index: usize,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Probes a media asset. Fails when the asset is missing or not a
    /// well-formed asset of its kind.
    fn probe(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;
}
