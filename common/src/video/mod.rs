//! Video input and output through ffmpeg subprocesses.
//!
//! Frames cross the process boundary as headerless `rgb24` rawvideo, so the
//! only thing either side needs to agree on is the frame size.

pub mod encoder;
pub mod probe;
pub mod source;

use image::RgbImage;
use std::process::Command;
use tracing::{debug, warn};

use crate::frame::Frame;

pub use encoder::{EncoderError, OutputCodec, VideoEncoder};
pub use probe::{probe, VideoInfo};
pub use source::{FfmpegSource, SourceError};

/// A sequential supply of decoded frames.
pub trait FrameSource {
    /// Decode the next frame. `Ok(None)` marks end of stream, not an error.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Seek back so the next decode returns the first frame again.
    fn rewind(&mut self) -> Result<(), SourceError>;

    /// Frame size as `(width, height)`.
    fn dimensions(&self) -> (u32, u32);
}

/// Consumer of annotated frames, written in the order they are given.
pub trait FrameSink {
    fn write_frame(&mut self, image: &RgbImage) -> Result<(), EncoderError>;
}

/// Check whether ffmpeg is available on PATH. Logs a warning if not found.
pub fn check_ffmpeg_available(ffmpeg: &str) {
    match Command::new(ffmpeg).arg("-version").output() {
        Ok(out) if out.status.success() => {
            debug!(ffmpeg, "ffmpeg is available");
        }
        Ok(_) => {
            warn!(ffmpeg, "ffmpeg returned non-zero for -version; decoding may fail");
        }
        Err(e) => {
            warn!(
                ffmpeg,
                error = %e,
                "ffmpeg not found; video sources cannot be opened. \
                 Install ffmpeg (with ffprobe and ffplay) or set [tools] in the config."
            );
        }
    }
}
