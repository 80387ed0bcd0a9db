use std::path::Path;

use crate::video::domain::audio_restorer::AudioRestorer;

/// Copies the original target's audio stream onto the merged (silent)
/// video by remuxing both streams into the destination file.
///
/// Nothing is re-encoded: video packets come from the merged file and
/// audio packets from the source, both stream-copied. A source without
/// an audio stream is an error, which the orchestrator recovers from by
/// shipping the silent video.
pub struct FfmpegAudioRestorer;

impl AudioRestorer for FfmpegAudioRestorer {
    fn restore(
        &self,
        source: &Path,
        merged: &Path,
        dest: &Path,
        _fps: f64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut video_ictx = ffmpeg_next::format::input(merged)?;
        let mut audio_ictx = ffmpeg_next::format::input(source)?;

        let video_stream = video_ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("no video stream in merged file")?;
        let video_src_idx = video_stream.index();
        let video_in_tb = video_stream.time_base();

        let audio_stream = audio_ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or("no audio stream in source file")?;
        let audio_src_idx = audio_stream.index();
        let audio_in_tb = audio_stream.time_base();

        let mut octx = ffmpeg_next::format::output(dest)?;

        let mut ost_video =
            octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost_video.set_parameters(video_stream.parameters());
        unsafe {
            (*ost_video.parameters().as_mut_ptr()).codec_tag = 0;
        }
        let video_ost_idx = ost_video.index();

        let mut ost_audio =
            octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost_audio.set_parameters(audio_stream.parameters());
        unsafe {
            (*ost_audio.parameters().as_mut_ptr()).codec_tag = 0;
        }
        let audio_ost_idx = ost_audio.index();

        octx.write_header()?;

        let ost_video_tb = octx
            .stream(video_ost_idx)
            .ok_or("missing video output stream")?
            .time_base();
        let ost_audio_tb = octx
            .stream(audio_ost_idx)
            .ok_or("missing audio output stream")?
            .time_base();

        for (stream, mut packet) in video_ictx.packets() {
            if stream.index() != video_src_idx {
                continue;
            }
            packet.rescale_ts(video_in_tb, ost_video_tb);
            packet.set_stream(video_ost_idx);
            packet.set_position(-1);
            packet.write_interleaved(&mut octx)?;
        }

        for (stream, mut packet) in audio_ictx.packets() {
            if stream.index() != audio_src_idx {
                continue;
            }
            packet.rescale_ts(audio_in_tb, ost_audio_tb);
            packet.set_stream(audio_ost_idx);
            packet.set_position(-1);
            packet.write_interleaved(&mut octx)?;
        }

        octx.write_trailer()?;
        Ok(())
    }
}
