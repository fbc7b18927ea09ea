use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::SourceError;

/// Stream properties of the first video stream of a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate, if the container reports one.
    pub fps: Option<f64>,
}

/// Ask ffprobe for the size and frame rate of `path`'s first video stream.
pub fn probe(ffprobe: &str, path: &Path) -> Result<VideoInfo, SourceError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .map_err(|e| SourceError::Probe {
            path: path.display().to_string(),
            reason: format!("failed to run {ffprobe}: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::Open {
            path: path.display().to_string(),
            reason: stderr.trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&stdout)
        .ok_or_else(|| SourceError::NoVideoStream(path.display().to_string()))?;
    debug!(
        path = path.display().to_string(),
        width = info.width,
        height = info.height,
        fps = info.fps,
        "probed video source"
    );
    Ok(info)
}

/// Parse `width,height,num/den` as printed by `ffprobe -of csv=p=0`.
fn parse_probe_output(stdout: &str) -> Option<VideoInfo> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let mut fields = line.split(',').map(str::trim);

    let width: u32 = fields.next()?.parse().ok()?;
    let height: u32 = fields.next()?.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    let fps = fields.next().and_then(parse_rate);

    Some(VideoInfo { width, height, fps })
}

fn parse_rate(rate: &str) -> Option<f64> {
    let (num, den) = match rate.split_once('/') {
        Some((n, d)) => (n.parse::<f64>().ok()?, d.parse::<f64>().ok()?),
        None => (rate.parse::<f64>().ok()?, 1.0),
    };
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_and_rate() {
        let info = parse_probe_output("1280,720,30000/1001\n").unwrap();
        assert_eq!(info.width, 1280);
        assert_eq!(info.height, 720);
        let fps = info.fps.unwrap();
        assert!((fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn unknown_rate_is_none() {
        // Some capture devices report 0/0
        let info = parse_probe_output("640,480,0/0").unwrap();
        assert_eq!((info.width, info.height), (640, 480));
        assert!(info.fps.is_none());
    }

    #[test]
    fn skips_blank_lines() {
        let info = parse_probe_output("\n\n320,240,25/1\n").unwrap();
        assert_eq!(info.fps, Some(25.0));
    }

    #[test]
    fn empty_output_means_no_video_stream() {
        assert!(parse_probe_output("").is_none());
        assert!(parse_probe_output("0,0,30/1").is_none());
        assert!(parse_probe_output("N/A,N/A,30/1").is_none());
    }
}
