mod render;

use capscan_common::config::{Config, ConfigError};
use capscan_common::video::{
    check_ffmpeg_available, EncoderError, FfmpegSource, FrameSource, OutputCodec, SourceError, VideoEncoder,
};
use capscan_vision::DetectionParameters;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use crate::render::{RenderError, RenderSummary};

#[derive(Debug, Error)]
enum CliError {
    #[error("usage: capscan-render <video>")]
    Usage,
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid output codec: {0}")]
    Codec(EncoderError),
    #[error("failed to open video: {} ({source})", path.display())]
    Open { path: PathBuf, source: SourceError },
    #[error("failed to open output video: {} ({source})", path.display())]
    Encoder { path: PathBuf, source: EncoderError },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to finalize output: {0}")]
    Finish(EncoderError),
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    // Every subprocess handle is dropped inside `run`, before the exit.
    if let Err(e) = run(&args) {
        error!(error = %e, "render failed");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

/// The single input path, or a usage error.
fn parse_args(args: &[String]) -> Result<PathBuf, CliError> {
    match args {
        [input] => Ok(PathBuf::from(input)),
        _ => Err(CliError::Usage),
    }
}

fn run(args: &[String]) -> Result<RenderSummary, CliError> {
    let input = parse_args(args)?;
    let config = Config::discover()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        input = %input.display(),
        output = %config.output.path.display(),
        fps = config.output.fps,
        codec = config.output.codec,
        "starting capscan render"
    );

    check_ffmpeg_available(&config.tools.ffmpeg);

    let codec: OutputCodec = config.output.codec.parse().map_err(CliError::Codec)?;

    let mut source = FfmpegSource::open(&input, &config.tools).map_err(|source| CliError::Open {
        path: input.clone(),
        source,
    })?;

    let (width, height) = source.dimensions();
    let mut encoder = VideoEncoder::start(
        &config.tools.ffmpeg,
        &config.output.path,
        width,
        height,
        config.output.fps,
        codec,
    )
    .map_err(|source| CliError::Encoder {
        path: config.output.path.clone(),
        source,
    })?;

    let params = DetectionParameters::new(&config.detection, &config.playback);
    let summary = render::render(&mut source, &mut encoder, &params)?;
    drop(source);

    let written = encoder.finish().map_err(CliError::Finish)?;
    info!(
        frames = summary.frames,
        written,
        detections = summary.detections,
        peak = summary.peak,
        output = %config.output.path.display(),
        "render complete"
    );
    Ok(summary)
}
