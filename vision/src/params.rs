use capscan_common::config::{DetectionConfig, PlaybackConfig};
use std::time::Duration;

/// Hue upper limit in the 8-bit HSV convention.
pub const HUE_MAX: u8 = 180;
/// Speed steps run 1..=20 where 10 is 1.0x, so each step is 0.1x.
pub const SPEED_STEP_MIN: u8 = 1;
pub const SPEED_STEP_MAX: u8 = 20;
pub const SPEED_STEP_NORMAL: u8 = 10;

/// Everything the operator can tune while the video runs.
///
/// Read once per frame by [`crate::detect`]. Lower bounds above their upper
/// bound are kept as-is and simply produce an empty mask.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParameters {
    /// Inclusive lower bound per HSV channel.
    pub lower: [u8; 3],
    /// Inclusive upper bound per HSV channel.
    pub upper: [u8; 3],
    pub min_area: u32,
    pub max_area: u32,
    pub speed_step: u8,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self::new(&DetectionConfig::default(), &PlaybackConfig::default())
    }
}

impl DetectionParameters {
    pub fn new(detection: &DetectionConfig, playback: &PlaybackConfig) -> Self {
        Self {
            lower: [detection.lower_hue, detection.lower_sat, detection.lower_val],
            upper: [detection.upper_hue, detection.upper_sat, detection.upper_val],
            min_area: detection.min_area,
            max_area: detection.max_area,
            speed_step: playback
                .speed_step
                .clamp(SPEED_STEP_MIN, SPEED_STEP_MAX),
        }
    }

    /// Inclusive area gate applied to every contour.
    pub fn accepts_area(&self, area: f64) -> bool {
        area >= self.min_area as f64 && area <= self.max_area as f64
    }

    /// Playback rate as a multiplier of the source rate.
    pub fn speed_factor(&self) -> f64 {
        self.speed_step.max(SPEED_STEP_MIN) as f64 / SPEED_STEP_NORMAL as f64
    }

    /// How long one tick waits for input: `max(1, base * 10 / step)` ms.
    pub fn frame_delay(&self, base_delay_ms: u64) -> Duration {
        let step = self.speed_step.clamp(SPEED_STEP_MIN, SPEED_STEP_MAX) as u64;
        let ms = (base_delay_ms * SPEED_STEP_NORMAL as u64 / step).max(1);
        Duration::from_millis(ms)
    }
}
