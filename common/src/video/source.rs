use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

use super::probe::{probe, VideoInfo};
use super::FrameSource;
use crate::config::ToolsConfig;
use crate::frame::{frame_len, Frame, FrameError};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to open video {path}: {reason}")]
    Open { path: String, reason: String },
    #[error("failed to probe video {path}: {reason}")]
    Probe { path: String, reason: String },
    #[error("no video stream in {0}")]
    NoVideoStream(String),
    #[error("failed to read frame from decoder: {0}")]
    Read(#[from] io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Decodes a file or capture device by piping `rgb24` rawvideo out of an
/// ffmpeg child process.
///
/// The child is killed and reaped when the source is dropped or rewound.
pub struct FfmpegSource {
    path: PathBuf,
    ffmpeg: String,
    info: VideoInfo,
    child: Child,
    stdout: BufReader<ChildStdout>,
    next_seq: u64,
}

impl FfmpegSource {
    pub fn open(path: &Path, tools: &ToolsConfig) -> Result<Self, SourceError> {
        let info = probe(&tools.ffprobe, path)?;
        let (child, stdout) = spawn_decoder(&tools.ffmpeg, path)?;

        info!(
            path = path.display().to_string(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            "opened video source"
        );

        Ok(Self {
            path: path.to_path_buf(),
            ffmpeg: tools.ffmpeg.clone(),
            info,
            child,
            stdout,
            next_seq: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> VideoInfo {
        self.info
    }

    fn stop_decoder(&mut self) {
        if let Err(e) = self.child.kill() {
            // Already exited is the common case at end of stream.
            debug!(error = %e, "decoder kill failed");
        }
        let _ = self.child.wait();
    }
}

impl FrameSource for FfmpegSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let len = frame_len(self.info.width, self.info.height);
        let mut buf = vec![0u8; len];
        let filled = read_full(&mut self.stdout, &mut buf)?;

        if filled == 0 {
            debug!(frames = self.next_seq, "decoder reached end of stream");
            return Ok(None);
        }
        if filled < len {
            warn!(
                got = filled,
                expected = len,
                "truncated final frame from decoder, treating as end of stream"
            );
            return Ok(None);
        }

        let frame = Frame::from_rgb24(buf, self.info.width, self.info.height, self.next_seq)?;
        self.next_seq += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        self.stop_decoder();
        let (child, stdout) = spawn_decoder(&self.ffmpeg, &self.path)?;
        self.child = child;
        self.stdout = stdout;
        self.next_seq = 0;
        debug!(path = self.path.display().to_string(), "decoder restarted from first frame");
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stop_decoder();
    }
}

fn spawn_decoder(ffmpeg: &str, path: &Path) -> Result<(Child, BufReader<ChildStdout>), SourceError> {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin", "-noautorotate", "-i"])
        .arg(path)
        .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    let mut child = cmd.spawn().map_err(|e| SourceError::Open {
        path: path.display().to_string(),
        reason: format!("failed to spawn {ffmpeg}: {e}"),
    })?;

    let Some(stdout) = child.stdout.take() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(SourceError::Open {
            path: path.display().to_string(),
            reason: "could not get decoder stdout handle".into(),
        });
    };

    Ok((child, BufReader::with_capacity(1 << 20, stdout)))
}

/// Fill `buf` from `reader`, returning how many bytes were read before EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
