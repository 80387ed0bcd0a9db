use std::path::{Path, PathBuf};

use crate::video::domain::video_merger::VideoMerger;

/// Encodes processed frame files back into a video via ffmpeg-next.
///
/// Uses MPEG4 as a widely compatible encoder with a bitrate derived
/// from the configured quality. Frames that do not match the output
/// resolution are rescaled on the way in.
pub struct FfmpegVideoMerger;

/// Bits per pixel per frame at quality 0 and 100; the configured
/// quality interpolates between them.
const MIN_BITS_PER_PIXEL: f64 = 0.05;
const MAX_BITS_PER_PIXEL: f64 = 0.4;

impl VideoMerger for FfmpegVideoMerger {
    fn merge(
        &self,
        frame_paths: &[PathBuf],
        fps: f64,
        resolution: (u32, u32),
        dest: &Path,
        quality: u8,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame_paths.is_empty() {
            return Err("no frames to merge".into());
        }
        ffmpeg_next::init()?;

        let (width, height) = resolution;
        let mut octx = ffmpeg_next::format::output(dest)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_bit_rate(bit_rate(width, height, fps, quality));

        let fps_i = fps.round() as i32;
        let fps_i = if fps_i <= 0 { 30 } else { fps_i };
        let time_base = ffmpeg_next::Rational(1, fps_i);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps_i, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);

        octx.write_header()?;
        let ost_time_base = octx.stream(0).ok_or("missing output stream")?.time_base();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        for (index, path) in frame_paths.iter().enumerate() {
            let rgb_frame = load_rgb_frame(path, width, height)?;
            let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb_frame, &mut yuv_frame)?;
            yuv_frame.set_pts(Some(index as i64));

            encoder.send_frame(&yuv_frame)?;
            drain_packets(&mut encoder, &mut octx, time_base, ost_time_base)?;
        }

        encoder.send_eof()?;
        drain_packets(&mut encoder, &mut octx, time_base, ost_time_base)?;
        octx.write_trailer()?;
        Ok(())
    }
}

fn bit_rate(width: u32, height: u32, fps: f64, quality: u8) -> usize {
    let quality = quality.min(100) as f64 / 100.0;
    let bits_per_pixel = MIN_BITS_PER_PIXEL + quality * (MAX_BITS_PER_PIXEL - MIN_BITS_PER_PIXEL);
    let fps = if fps > 0.0 { fps } else { 30.0 };
    (bits_per_pixel * width as f64 * height as f64 * fps) as usize
}

/// Reads a frame file into an ffmpeg RGB24 frame, rescaling when the
/// file does not match the output resolution.
fn load_rgb_frame(
    path: &Path,
    width: u32,
    height: u32,
) -> Result<ffmpeg_next::util::frame::video::Video, Box<dyn std::error::Error>> {
    let image = image::open(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?
        .to_rgb8();
    let image = if image.dimensions() == (width, height) {
        image
    } else {
        image::imageops::resize(&image, width, height, image::imageops::FilterType::Triangle)
    };

    let mut rgb_frame =
        ffmpeg_next::util::frame::video::Video::new(ffmpeg_next::format::Pixel::RGB24, width, height);
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data_mut(0);
    let row_bytes = width as usize * 3;
    for (row_index, row) in image.as_raw().chunks_exact(row_bytes).enumerate() {
        let start = row_index * stride;
        data[start..start + row_bytes].copy_from_slice(row);
    }
    Ok(rgb_frame)
}

fn drain_packets(
    encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(0);
        encoded.rescale_ts(time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}
