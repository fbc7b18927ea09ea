use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CAPSCAN_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "capscan.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Startup values for the tunable HSV range and area bounds.
///
/// Hue uses the 8-bit convention (0..=180), saturation and value 0..=255.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_lower_hue")]
    pub lower_hue: u8,
    #[serde(default = "default_lower_sat")]
    pub lower_sat: u8,
    #[serde(default = "default_lower_val")]
    pub lower_val: u8,
    #[serde(default = "default_upper_hue")]
    pub upper_hue: u8,
    #[serde(default = "default_upper_sat")]
    pub upper_sat: u8,
    #[serde(default = "default_upper_val")]
    pub upper_val: u8,
    #[serde(default = "default_min_area")]
    pub min_area: u32,
    #[serde(default = "default_max_area")]
    pub max_area: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// Nominal per-tick delay at 1.0x speed.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Initial speed step, 1..=20 where 10 is 1.0x.
    #[serde(default = "default_speed_step")]
    pub speed_step: u8,
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_show_panel")]
    pub show_panel: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default = "default_output_fps")]
    pub fps: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
}

/// Locations of the external media tools.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
    #[serde(default = "default_ffplay")]
    pub ffplay: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            lower_hue: default_lower_hue(),
            lower_sat: default_lower_sat(),
            lower_val: default_lower_val(),
            upper_hue: default_upper_hue(),
            upper_sat: default_upper_sat(),
            upper_val: default_upper_val(),
            min_area: default_min_area(),
            max_area: default_max_area(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            speed_step: default_speed_step(),
            window_title: default_window_title(),
            show_panel: default_show_panel(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            fps: default_output_fps(),
            codec: default_codec(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            ffplay: default_ffplay(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the config the way both binaries do: `$CAPSCAN_CONFIG` must
    /// exist if set, `capscan.toml` is optional, otherwise built-in defaults.
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            Self::load(fallback)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// Default value functions
fn default_lower_hue() -> u8 {
    100
}
fn default_lower_sat() -> u8 {
    50
}
fn default_lower_val() -> u8 {
    50
}
fn default_upper_hue() -> u8 {
    130
}
fn default_upper_sat() -> u8 {
    255
}
fn default_upper_val() -> u8 {
    255
}
fn default_min_area() -> u32 {
    40
}
fn default_max_area() -> u32 {
    50_000
}
fn default_base_delay_ms() -> u64 {
    30
}
fn default_speed_step() -> u8 {
    10
}
fn default_window_title() -> String {
    "Bottle Detection".into()
}
fn default_show_panel() -> bool {
    true
}
fn default_output_path() -> PathBuf {
    PathBuf::from("output.mp4")
}
fn default_output_fps() -> u32 {
    30
}
fn default_codec() -> String {
    "mpeg4".into()
}
fn default_ffmpeg() -> String {
    "ffmpeg".into()
}
fn default_ffprobe() -> String {
    "ffprobe".into()
}
fn default_ffplay() -> String {
    "ffplay".into()
}
fn default_log_level() -> String {
    "info".into()
}
