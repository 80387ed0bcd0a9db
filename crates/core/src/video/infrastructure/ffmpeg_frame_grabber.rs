use std::path::Path;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_grabber::FrameGrabber;
use crate::video::infrastructure::decode::{self, DecodeSession};

/// Read-side media access via ffmpeg-next and the image crate.
pub struct FfmpegFrameGrabber;

impl FrameGrabber for FfmpegFrameGrabber {
    fn read_image(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        Frame::load(path, 0)
    }

    /// Sequentially decodes up to `index`; reference frames sit near the
    /// start of the video, so no seeking is needed.
    fn grab_frame(
        &self,
        video: &Path,
        index: usize,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut session = DecodeSession::open(video, None)?;
        let (width, height) = session.output_size();
        let mut current = 0;
        while let Some(pixels) = session.next_frame()? {
            if current == index {
                return Ok(Some(Frame::new(pixels, width, height, index)));
            }
            current += 1;
        }
        Ok(None)
    }

    fn probe(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if is_image_path(path) {
            let (width, height) = image::image_dimensions(path)
                .map_err(|e| format!("failed to probe {}: {e}", path.display()))?;
            return Ok(VideoMetadata {
                width,
                height,
                fps: 0.0,
                total_frames: 1,
                codec: path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or_default()
                    .to_lowercase(),
                source_path: Some(path.to_path_buf()),
            });
        }
        decode::probe(path)
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::infrastructure::test_support::create_test_video;
    use tempfile::TempDir;

    #[test]
    fn test_probe_video_metadata() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("clip.mp4");
        create_test_video(&video, 5, 160, 120, 25.0);

        let meta = FfmpegFrameGrabber.probe(&video).unwrap();
        assert_eq!((meta.width, meta.height), (160, 120));
        assert!(meta.total_frames >= 5);
        assert!((meta.fps - 25.0).abs() < 0.5);
    }

    #[test]
    fn test_probe_image_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.png");
        Frame::new(vec![5; 8 * 6 * 3], 8, 6, 0).save(&path).unwrap();

        let meta = FfmpegFrameGrabber.probe(&path).unwrap();
        assert_eq!((meta.width, meta.height), (8, 6));
        assert_eq!(meta.total_frames, 1);
        assert_eq!(meta.fps, 0.0);
    }

    #[test]
    fn test_probe_missing_file_is_error() {
        assert!(FfmpegFrameGrabber
            .probe(Path::new("/nonexistent/clip.mp4"))
            .is_err());
    }

    #[test]
    fn test_grab_frame_by_index() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("clip.mp4");
        create_test_video(&video, 5, 160, 120, 25.0);

        let frame = FfmpegFrameGrabber.grab_frame(&video, 2).unwrap().unwrap();
        assert_eq!(frame.width(), 160);
        assert_eq!(frame.height(), 120);
        assert_eq!(frame.index(), 2);
    }

    #[test]
    fn test_grab_frame_past_end_is_none() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("clip.mp4");
        create_test_video(&video, 3, 160, 120, 25.0);

        assert!(FfmpegFrameGrabber.grab_frame(&video, 50).unwrap().is_none());
    }

    #[test]
    fn test_read_image_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.png");
        Frame::new(vec![42; 4 * 4 * 3], 4, 4, 0).save(&path).unwrap();

        let frame = FfmpegFrameGrabber.read_image(&path).unwrap();
        assert_eq!(frame.data(), &vec![42u8; 4 * 4 * 3][..]);
    }
}
