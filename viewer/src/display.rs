use image::RgbImage;
use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("failed to spawn display ({0})")]
    Spawn(String),
    #[error("display window was closed")]
    Closed,
    #[error("display expects {want_w}x{want_h} frames, got {got_w}x{got_h}")]
    DimensionMismatch {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
    #[error("failed to write frame to display: {0}")]
    Write(io::Error),
}

/// Lowest input rate declared to ffplay.
const MIN_DISPLAY_RATE: f64 = 120.0;

/// Input rate to declare to ffplay when frames arrive at most every
/// `fastest_tick`.
///
/// The player paces itself, so ffplay only needs to consume frames faster
/// than they are written. Declaring the source's own rate would make it queue
/// frames at higher speeds.
pub fn display_rate(fastest_tick: Duration) -> f64 {
    let ms = fastest_tick.as_millis().max(1) as f64;
    (1000.0 / ms).max(MIN_DISPLAY_RATE)
}

/// Somewhere to show frames.
pub trait FrameDisplay {
    fn show(&mut self, image: &RgbImage) -> Result<(), DisplayError>;
}

/// An ffplay window fed `rgb24` frames over stdin.
///
/// Dropping it closes the pipe and kills the player.
pub struct FfplayDisplay {
    child: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
}

impl FfplayDisplay {
    pub fn open(ffplay: &str, title: &str, width: u32, height: u32, fps: f64) -> Result<Self, DisplayError> {
        let size = format!("{width}x{height}");
        let rate = format!("{fps:.3}");

        let mut child = Command::new(ffplay)
            .args([
                "-hide_banner",
                "-loglevel", "error",
                "-f", "rawvideo",
                "-pixel_format", "rgb24",
                "-video_size", &size,
                "-framerate", &rate,
                "-fflags", "nobuffer",
                "-framedrop",
                "-window_title", title,
                "-i", "pipe:0",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DisplayError::Spawn(format!("{ffplay}: {e}")))?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DisplayError::Spawn("could not get stdin handle".into()));
        };

        debug!(width, height, fps, title, "display opened");
        Ok(Self {
            child,
            stdin: Some(stdin),
            width,
            height,
        })
    }
}

impl FrameDisplay for FfplayDisplay {
    fn show(&mut self, image: &RgbImage) -> Result<(), DisplayError> {
        let (w, h) = image.dimensions();
        if (w, h) != (self.width, self.height) {
            return Err(DisplayError::DimensionMismatch {
                got_w: w,
                got_h: h,
                want_w: self.width,
                want_h: self.height,
            });
        }
        let stdin = self.stdin.as_mut().ok_or(DisplayError::Closed)?;
        stdin.write_all(image.as_raw()).map_err(|e| match e.kind() {
            io::ErrorKind::BrokenPipe => DisplayError::Closed,
            _ => DisplayError::Write(e),
        })
    }
}

impl Drop for FfplayDisplay {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_outpaces_fastest_tick() {
        assert_eq!(display_rate(Duration::from_millis(15)), MIN_DISPLAY_RATE);
        assert_eq!(display_rate(Duration::from_millis(4)), 250.0);
        assert_eq!(display_rate(Duration::from_millis(1)), 1000.0);
        assert_eq!(display_rate(Duration::ZERO), 1000.0);
        for ms in 1..=300 {
            let tick = Duration::from_millis(ms);
            assert!(display_rate(tick) * tick.as_secs_f64() >= 1.0, "tick {ms} ms");
        }
    }

    #[test]
    fn missing_player_is_a_spawn_error() {
        let err = FfplayDisplay::open("/nonexistent/ffplay", "t", 4, 4, MIN_DISPLAY_RATE)
            .err()
            .unwrap();
        assert!(matches!(err, DisplayError::Spawn(_)));
    }
}
