use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::shared::constants::{FRAME_EXTENSION, FRAME_INDEX_WIDTH};
use crate::shared::run_config::RunConfiguration;
use crate::video::domain::frame_extractor::FrameExtractor;
use crate::video::infrastructure::decode::DecodeSession;

/// Decodes the target at the requested resolution, resamples to the
/// requested frame rate, honors the trim range, and writes zero-padded
/// JPEG frame files into the workspace directory.
pub struct FfmpegFrameExtractor;

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract(
        &self,
        target: &Path,
        frames_dir: &Path,
        resolution: (u32, u32),
        fps: f64,
        config: &RunConfiguration,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let mut session = DecodeSession::open(target, Some(resolution))?;
        let source_fps = session.source_fps();
        let trim_start = config.trim_frame_start.unwrap_or(0);
        let trim_end = config.trim_frame_end.unwrap_or(usize::MAX);
        let quality = config.temp_frame_quality;
        let (width, height) = session.output_size();

        let mut source_index: usize = 0;
        let mut output_index: usize = 0;

        while let Some(pixels) = session.next_frame()? {
            if source_index >= trim_end {
                break;
            }
            if source_index < trim_start {
                source_index += 1;
                continue;
            }

            // Source frame n (relative to the trim start) covers the
            // interval [n/src_fps, (n+1)/src_fps); emit every output
            // instant that falls inside it.
            let relative = (source_index - trim_start) as f64;
            let emit_until = if source_fps > 0.0 && fps > 0.0 {
                (relative + 1.0) * fps / source_fps
            } else {
                relative + 1.0 // unknown rate: copy 1:1
            };

            if (output_index as f64) < emit_until {
                let image = RgbImage::from_raw(width, height, pixels)
                    .ok_or("decoded frame has unexpected size")?;
                while (output_index as f64) < emit_until {
                    write_jpeg(frames_dir, output_index, &image, quality)?;
                    output_index += 1;
                }
            }

            source_index += 1;
        }

        Ok(output_index)
    }
}

fn write_jpeg(
    frames_dir: &Path,
    index: usize,
    image: &RgbImage,
    quality: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = frames_dir.join(format!(
        "{index:0width$}.{FRAME_EXTENSION}",
        width = FRAME_INDEX_WIDTH
    ));
    let file = fs::File::create(&path)
        .map_err(|e| format!("failed to create {}: {e}", path.display()))?;
    let mut encoder = JpegEncoder::new_with_quality(file, quality.clamp(1, 100));
    encoder.encode_image(image)?;
    Ok(())
}
