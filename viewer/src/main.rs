mod app;
mod commands;
mod controls;
mod display;
mod keys;
mod panel;
mod playback;
mod terminal;

use capscan_common::config::Config;
use capscan_common::video::check_ffmpeg_available;
use std::path::PathBuf;
use tracing::{info, warn};

fn main() {
    let mut args = std::env::args().skip(1);
    let initial = args.next().map(PathBuf::from);
    let extra: Vec<String> = args.collect();

    // A bad config should not keep the viewer from starting.
    let (config, config_error) = match Config::discover() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    if let Some(e) = config_error {
        warn!(error = %e, "failed to load config, using defaults");
        eprintln!("{e}; continuing with default settings");
    }
    if !extra.is_empty() {
        warn!(ignored = ?extra, "extra arguments ignored; usage: capscan [VIDEO]");
    }

    info!(
        source = ?initial,
        lower = ?[config.detection.lower_hue, config.detection.lower_sat, config.detection.lower_val],
        upper = ?[config.detection.upper_hue, config.detection.upper_sat, config.detection.upper_val],
        min_area = config.detection.min_area,
        max_area = config.detection.max_area,
        "starting capscan viewer"
    );

    check_ffmpeg_available(&config.tools.ffmpeg);

    app::run(&config, initial);
}
