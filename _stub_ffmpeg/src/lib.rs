//! THROWAWAY compile-only stub of `ffmpeg-next`. Not shipped.
//! Exists solely so the video/infrastructure glue and the CLI can be
//! type-checked offline, where ffmpeg system libs are unavailable.
//! Signatures mirror the subset of the ffmpeg-next 7.x API the crate uses.
#![allow(clippy::all)]
use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub struct Error(pub String);
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ffmpeg stub error: {}", self.0)
    }
}
impl std::error::Error for Error {}

pub fn init() -> Result<(), Error> {
    Ok(())
}

#[derive(Clone, Copy)]
pub struct Rational(pub i32, pub i32);
impl Rational {
    pub fn numerator(&self) -> i32 {
        self.0
    }
    pub fn denominator(&self) -> i32 {
        self.1
    }
}

pub struct Dictionary;
impl Dictionary {
    pub fn new() -> Self {
        Dictionary
    }
}

#[repr(C)]
pub struct AVCodecParameters {
    pub codec_tag: u32,
}

pub struct Parameters;
impl Parameters {
    pub fn as_mut_ptr(&self) -> *mut AVCodecParameters {
        std::ptr::null_mut()
    }
}

#[derive(Clone, Copy)]
pub struct Codec;
impl Codec {
    pub fn name(&self) -> &str {
        "stub"
    }
}

pub struct Packet;
impl Packet {
    pub fn empty() -> Self {
        Packet
    }
    pub fn set_stream(&mut self, _i: usize) {}
    pub fn set_position(&mut self, _p: i64) {}
    pub fn rescale_ts(&mut self, _a: Rational, _b: Rational) {}
    pub fn write_interleaved(&mut self, _octx: &mut format::context::Output) -> Result<(), Error> {
        Ok(())
    }
}

pub mod media {
    pub enum Type {
        Video,
        Audio,
    }
}

pub mod codec {
    use super::Error;

    #[derive(Clone, Copy, PartialEq)]
    pub enum Id {
        None,
        MPEG4,
    }

    pub struct Flags;
    impl Flags {
        pub const GLOBAL_HEADER: Flags = Flags;
    }

    pub mod context {
        use super::super::{Codec, Error, Parameters};

        pub struct Context;
        impl Context {
            pub fn from_parameters(_p: Parameters) -> Result<Context, Error> {
                Ok(Context)
            }
            pub fn new_with_codec(_c: Codec) -> Context {
                Context
            }
            pub fn decoder(self) -> Decoder {
                Decoder
            }
            pub fn encoder(self) -> Encoder {
                Encoder
            }
        }

        pub struct Decoder;
        impl Decoder {
            pub fn video(self) -> Result<super::super::decoder::Video, Error> {
                Ok(super::super::decoder::Video)
            }
        }

        pub struct Encoder;
        impl Encoder {
            pub fn video(self) -> Result<super::encoder::video::Video, Error> {
                Ok(super::encoder::video::Video)
            }
        }
    }

    pub mod encoder {
        use super::super::{Dictionary, Error, Rational};

        pub mod video {
            use super::super::super::{Dictionary, Error, Rational};
            use super::super::Flags;

            pub struct Video;
            impl Video {
                pub fn set_width(&mut self, _w: u32) {}
                pub fn set_height(&mut self, _h: u32) {}
                pub fn set_format(&mut self, _f: super::super::super::format::Pixel) {}
                pub fn set_bit_rate(&mut self, _b: usize) {}
                pub fn set_time_base(&mut self, _t: Rational) {}
                pub fn set_frame_rate(&mut self, _r: Option<Rational>) {}
                pub fn set_flags(&mut self, _f: Flags) {}
                pub fn open_with(self, _d: Dictionary) -> Result<Encoder, Error> {
                    Ok(Encoder)
                }
            }

            pub struct Encoder;
            impl Encoder {
                pub fn send_frame(
                    &mut self,
                    _f: &super::super::super::util::frame::video::Video,
                ) -> Result<(), Error> {
                    Ok(())
                }
                pub fn send_eof(&mut self) -> Result<(), Error> {
                    Ok(())
                }
                pub fn receive_packet(
                    &mut self,
                    _p: &mut super::super::super::Packet,
                ) -> Result<(), Error> {
                    Err(Error("stub".into()))
                }
            }
        }
    }
}

pub mod decoder {
    use super::{Codec, Error};

    pub struct Video;
    impl Video {
        pub fn width(&self) -> u32 {
            0
        }
        pub fn height(&self) -> u32 {
            0
        }
        pub fn format(&self) -> super::format::Pixel {
            super::format::Pixel::RGB24
        }
        pub fn codec(&self) -> Option<Codec> {
            None
        }
        pub fn send_packet(&mut self, _p: &super::Packet) -> Result<(), Error> {
            Ok(())
        }
        pub fn send_eof(&mut self) -> Result<(), Error> {
            Ok(())
        }
        pub fn receive_frame(
            &mut self,
            _f: &mut super::util::frame::video::Video,
        ) -> Result<(), Error> {
            Err(Error("stub".into()))
        }
    }
}

pub mod encoder {
    use super::{codec::Id, Codec};
    pub fn find(_id: Id) -> Option<Codec> {
        Some(Codec)
    }
}

pub mod format {
    use super::{Codec, Error};
    use std::path::Path;

    pub struct Flags;
    impl Flags {
        pub const GLOBAL_HEADER: Flags = Flags;
        pub fn contains(&self, _f: Flags) -> bool {
            false
        }
    }

    #[derive(Clone, Copy)]
    pub enum Pixel {
        RGB24,
        YUV420P,
    }

    pub struct Format;
    impl Format {
        pub fn flags(&self) -> Flags {
            Flags
        }
    }

    pub fn input<P: AsRef<Path>>(_p: P) -> Result<context::Input, Error> {
        Ok(context::Input)
    }
    pub fn output<P: AsRef<Path>>(_p: P) -> Result<context::Output, Error> {
        Ok(context::Output)
    }

    pub mod stream {
        use super::super::{Parameters, Rational};

        pub struct Stream;
        impl Stream {
            pub fn index(&self) -> usize {
                0
            }
            pub fn parameters(&self) -> Parameters {
                Parameters
            }
            pub fn time_base(&self) -> Rational {
                Rational(1, 1)
            }
            pub fn rate(&self) -> Rational {
                Rational(0, 1)
            }
            pub fn frames(&self) -> i64 {
                0
            }
            pub fn duration(&self) -> i64 {
                0
            }
        }

        pub struct StreamMut;
        impl StreamMut {
            pub fn index(&self) -> usize {
                0
            }
            pub fn set_parameters<P>(&mut self, _p: P) {}
            pub fn parameters(&self) -> Parameters {
                Parameters
            }
        }
    }

    pub struct Streams;
    impl Streams {
        pub fn best(&self, _t: super::media::Type) -> Option<stream::Stream> {
            Some(stream::Stream)
        }
    }

    pub mod context {
        use super::super::{Codec, Error, Packet};
        use super::{stream, Format, Streams};

        pub struct Input;
        impl Input {
            pub fn streams(&self) -> Streams {
                Streams
            }
            pub fn packets(&mut self) -> PacketIter {
                PacketIter
            }
        }

        pub struct PacketIter;
        impl Iterator for PacketIter {
            type Item = (stream::Stream, Packet);
            fn next(&mut self) -> Option<Self::Item> {
                None
            }
        }

        pub struct Output;
        impl Output {
            pub fn format(&self) -> Format {
                Format
            }
            pub fn add_stream<E: Into<Option<Codec>>>(
                &mut self,
                _codec: E,
            ) -> Result<stream::StreamMut, Error> {
                Ok(stream::StreamMut)
            }
            pub fn write_header(&mut self) -> Result<(), Error> {
                Ok(())
            }
            pub fn write_trailer(&mut self) -> Result<(), Error> {
                Ok(())
            }
            pub fn stream(&self, _i: usize) -> Option<stream::Stream> {
                Some(stream::Stream)
            }
        }
    }
}

pub mod software {
    pub mod scaling {
        use super::super::Error;

        pub struct Flags;
        impl Flags {
            pub const BILINEAR: Flags = Flags;
        }

        pub struct Context;
        impl Context {
            #[allow(clippy::too_many_arguments)]
            pub fn get(
                _src_fmt: super::super::format::Pixel,
                _src_w: u32,
                _src_h: u32,
                _dst_fmt: super::super::format::Pixel,
                _dst_w: u32,
                _dst_h: u32,
                _flags: Flags,
            ) -> Result<Context, Error> {
                Ok(Context)
            }
            pub fn run(
                &mut self,
                _src: &super::super::util::frame::video::Video,
                _dst: &mut super::super::util::frame::video::Video,
            ) -> Result<(), Error> {
                Ok(())
            }
        }
    }
}

pub mod util {
    pub mod frame {
        pub mod video {
            pub struct Video {
                buf: Vec<u8>,
            }
            impl Video {
                pub fn empty() -> Self {
                    Video { buf: Vec::new() }
                }
                pub fn new(
                    _p: super::super::super::format::Pixel,
                    w: u32,
                    h: u32,
                ) -> Self {
                    Video {
                        buf: vec![0u8; (w as usize) * (h as usize) * 3],
                    }
                }
                pub fn stride(&self, _plane: usize) -> usize {
                    0
                }
                pub fn data(&self, _plane: usize) -> &[u8] {
                    &self.buf
                }
                pub fn data_mut(&mut self, _plane: usize) -> &mut [u8] {
                    &mut self.buf
                }
                pub fn set_pts(&mut self, _pts: Option<i64>) {}
            }
        }
    }
}
