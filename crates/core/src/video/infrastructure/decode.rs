//! Shared ffmpeg-next decode plumbing for the video infrastructure:
//! sequential RGB24 frame decoding and stream probing.

use std::path::Path;

use crate::shared::video_metadata::VideoMetadata;

/// Sequentially decodes a video's frames to tightly-packed RGB24 at an
/// optional output resolution.
pub(crate) struct DecodeSession {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    out_width: u32,
    out_height: u32,
    source_fps: f64,
    flushing: bool,
    done: bool,
}

// Safety: DecodeSession is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for DecodeSession {}

impl DecodeSession {
    pub fn open(
        path: &Path,
        output_size: Option<(u32, u32)>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("no video stream found")?;
        let stream_index = stream.index();
        let source_fps = stream_fps(&stream);

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let (out_width, out_height) =
            output_size.unwrap_or((decoder.width(), decoder.height()));

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::RGB24,
            out_width,
            out_height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            out_width,
            out_height,
            source_fps,
            flushing: false,
            done: false,
        })
    }

    pub fn output_size(&self) -> (u32, u32) {
        (self.out_width, self.out_height)
    }

    pub fn source_fps(&self) -> f64 {
        self.source_fps
    }

    /// The next decoded frame as tightly-packed RGB bytes, or `None` at
    /// end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }

        loop {
            if let Some(pixels) = self.try_receive()? {
                return Ok(Some(pixels));
            }
            if self.flushing {
                self.done = true;
                return Ok(None);
            }

            match next_packet(&mut self.ictx, self.stream_index) {
                Some(packet) => {
                    // Corrupt packets are skipped rather than failing decode
                    let _ = self.decoder.send_packet(&packet);
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;
        Ok(Some(extract_rgb_pixels(
            &rgb_frame,
            self.out_width,
            self.out_height,
        )))
    }
}

fn next_packet(
    ictx: &mut ffmpeg_next::format::context::Input,
    stream_index: usize,
) -> Option<ffmpeg_next::Packet> {
    for (stream, packet) in ictx.packets() {
        if stream.index() == stream_index {
            return Some(packet);
        }
    }
    None
}

/// Probes a video file without decoding any frames.
///
/// When the container does not record a frame count, it is estimated
/// from the stream duration and frame rate.
pub(crate) fn probe(path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;

    let ictx = ffmpeg_next::format::input(path)?;
    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("no video stream found")?;

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let decoder = codec_ctx.decoder().video()?;
    let fps = stream_fps(&stream);

    let mut total_frames = stream.frames().max(0) as usize;
    if total_frames == 0 && fps > 0.0 {
        let tb = stream.time_base();
        if stream.duration() > 0 && tb.denominator() != 0 {
            let seconds =
                stream.duration() as f64 * tb.numerator() as f64 / tb.denominator() as f64;
            total_frames = (seconds * fps).round() as usize;
        }
    }

    Ok(VideoMetadata {
        width: decoder.width(),
        height: decoder.height(),
        fps,
        total_frames,
        codec: decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default(),
        source_path: Some(path.to_path_buf()),
    })
}

fn stream_fps(stream: &ffmpeg_next::format::stream::Stream) -> f64 {
    let rate = stream.rate();
    if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// stripping per-row stride padding.
pub(crate) fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
