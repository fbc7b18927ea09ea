use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::str::FromStr;
use tracing::{debug, error, info};

use super::FrameSink;

/// Output codecs the batch renderer knows how to ask ffmpeg for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCodec {
    /// MPEG-4 Part 2, the `mp4v` fourcc.
    Mpeg4,
    H264,
    Mjpeg,
}

impl OutputCodec {
    fn ffmpeg_args(self) -> &'static [&'static str] {
        match self {
            OutputCodec::Mpeg4 => &["-c:v", "mpeg4", "-q:v", "3", "-pix_fmt", "yuv420p"],
            OutputCodec::H264 => &["-c:v", "libx264", "-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"],
            OutputCodec::Mjpeg => &["-c:v", "mjpeg", "-q:v", "3", "-pix_fmt", "yuvj420p"],
        }
    }
}

impl FromStr for OutputCodec {
    type Err = EncoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mpeg4" | "mp4v" => Ok(OutputCodec::Mpeg4),
            "h264" | "avc" => Ok(OutputCodec::H264),
            "mjpeg" | "mjpg" => Ok(OutputCodec::Mjpeg),
            other => Err(EncoderError::UnsupportedCodec(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("failed to open output {0}: {1}")]
    OutputOpen(String, std::io::Error),
    #[error("unsupported output codec {0:?}, expected mpeg4, h264 or mjpeg")]
    UnsupportedCodec(String),
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(String),
    #[error("frame is {got_w}x{got_h}, encoder expects {want_w}x{want_h}")]
    DimensionMismatch {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
    #[error("failed to write frame to ffmpeg stdin: {0}")]
    Write(String),
    #[error("failed to wait for ffmpeg: {0}")]
    Wait(String),
    #[error("ffmpeg exited with non-zero status: {0}")]
    FfmpegFailed(String),
}

/// An ffmpeg subprocess that turns `rgb24` frames on stdin into a video file.
///
/// If the encoder is dropped without [`VideoEncoder::finish`], the child is
/// killed and whatever it wrote so far is left on disk.
pub struct VideoEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    output_path: PathBuf,
    width: u32,
    height: u32,
    frame_count: u32,
}

impl VideoEncoder {
    /// Spawn an ffmpeg subprocess ready to receive raw frames of the given
    /// size on stdin, writing `output_path` at a constant `fps`.
    pub fn start(
        ffmpeg: &str,
        output_path: &Path,
        width: u32,
        height: u32,
        fps: u32,
        codec: OutputCodec,
    ) -> Result<Self, EncoderError> {
        // Surface an unwritable output path before ffmpeg gets the chance to
        // swallow it in its own stderr.
        File::create(output_path)
            .map_err(|e| EncoderError::OutputOpen(output_path.display().to_string(), e))?;

        let size = format!("{width}x{height}");
        let fps_str = fps.to_string();

        let mut cmd = Command::new(ffmpeg);
        cmd.args([
            "-hide_banner",
            "-loglevel", "error",
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-s", &size,
            "-r", &fps_str,
            "-i", "pipe:0",
            "-an",
        ])
        .args(codec.ffmpeg_args())
        .arg("-y")
        .arg(output_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| EncoderError::Spawn(e.to_string()))?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EncoderError::Spawn("could not get stdin handle".into()));
        };

        debug!(
            ?codec,
            fps,
            width,
            height,
            output = output_path.display().to_string(),
            "ffmpeg encoder started"
        );

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            output_path: output_path.to_path_buf(),
            width,
            height,
            frame_count: 0,
        })
    }

    /// Finalize the file: close stdin, wait for ffmpeg to flush and exit.
    /// Returns the number of frames written.
    pub fn finish(mut self) -> Result<u32, EncoderError> {
        // Close stdin so ffmpeg knows there are no more frames.
        drop(self.stdin.take());

        let Some(child) = self.child.take() else {
            return Ok(self.frame_count);
        };
        let output = child
            .wait_with_output()
            .map_err(|e| EncoderError::Wait(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr, "ffmpeg exited with error");
            return Err(EncoderError::FfmpegFailed(stderr.into_owned()));
        }

        info!(
            frame_count = self.frame_count,
            output = self.output_path.display().to_string(),
            "video encoding complete"
        );
        Ok(self.frame_count)
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

impl FrameSink for VideoEncoder {
    fn write_frame(&mut self, image: &RgbImage) -> Result<(), EncoderError> {
        let (w, h) = image.dimensions();
        if (w, h) != (self.width, self.height) {
            return Err(EncoderError::DimensionMismatch {
                got_w: w,
                got_h: h,
                want_w: self.width,
                want_h: self.height,
            });
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| EncoderError::Write("encoder already finished".into()))?;
        stdin
            .write_all(image.as_raw())
            .map_err(|e| EncoderError::Write(e.to_string()))?;
        self.frame_count += 1;
        debug!(frame_count = self.frame_count, "pushed frame to encoder");
        Ok(())
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
