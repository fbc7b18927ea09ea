use capscan_vision::params::{HUE_MAX, SPEED_STEP_MAX, SPEED_STEP_MIN};
use capscan_vision::DetectionParameters;

/// One adjustable entry of the on-screen control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    LowerHue,
    UpperHue,
    LowerSat,
    UpperSat,
    LowerVal,
    UpperVal,
    MinArea,
    MaxArea,
    Speed,
    Pause,
}

impl Control {
    pub const ALL: [Control; 10] = [
        Control::LowerHue,
        Control::UpperHue,
        Control::LowerSat,
        Control::UpperSat,
        Control::LowerVal,
        Control::UpperVal,
        Control::MinArea,
        Control::MaxArea,
        Control::Speed,
        Control::Pause,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::LowerHue => "Lower Hue",
            Control::UpperHue => "Upper Hue",
            Control::LowerSat => "Lower Sat",
            Control::UpperSat => "Upper Sat",
            Control::LowerVal => "Lower Val",
            Control::UpperVal => "Upper Val",
            Control::MinArea => "Min Area",
            Control::MaxArea => "Max Area",
            Control::Speed => "Speed",
            Control::Pause => "Pause",
        }
    }

    /// Inclusive value range.
    pub fn range(self) -> (u32, u32) {
        match self {
            Control::LowerHue | Control::UpperHue => (0, HUE_MAX as u32),
            Control::LowerSat | Control::UpperSat | Control::LowerVal | Control::UpperVal => (0, 255),
            Control::MinArea => (0, 10_000),
            Control::MaxArea => (0, 100_000),
            Control::Speed => (SPEED_STEP_MIN as u32, SPEED_STEP_MAX as u32),
            Control::Pause => (0, 1),
        }
    }

    /// Amount one key press moves the value.
    pub fn step(self) -> u32 {
        match self {
            Control::MinArea => 10,
            Control::MaxArea => 100,
            _ => 1,
        }
    }
}

/// What an adjustment did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// A detection or speed value changed.
    Changed,
    /// Already at the limit.
    Unchanged,
    /// The Pause control flipped; the caller owns the pause flag.
    TogglePause,
}

/// The tunable parameters plus which control is selected. Lives for the
/// whole program so settings carry over from one video to the next.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    pub params: DetectionParameters,
    selected: usize,
}

impl ControlPanel {
    pub fn new(params: DetectionParameters) -> Self {
        Self {
            params,
            selected: 0,
        }
    }

    pub fn selected(&self) -> Control {
        Control::ALL[self.selected]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % Control::ALL.len();
    }

    pub fn select_prev(&mut self) {
        self.selected = (self.selected + Control::ALL.len() - 1) % Control::ALL.len();
    }

    /// Current value of `control`. Pause reads from the playback state.
    pub fn value(&self, control: Control, paused: bool) -> u32 {
        let p = &self.params;
        match control {
            Control::LowerHue => p.lower[0] as u32,
            Control::UpperHue => p.upper[0] as u32,
            Control::LowerSat => p.lower[1] as u32,
            Control::UpperSat => p.upper[1] as u32,
            Control::LowerVal => p.lower[2] as u32,
            Control::UpperVal => p.upper[2] as u32,
            Control::MinArea => p.min_area,
            Control::MaxArea => p.max_area,
            Control::Speed => p.speed_step as u32,
            Control::Pause => paused as u32,
        }
    }

    /// Move the selected control by `steps` of its step size, clamped to its
    /// range.
    pub fn adjust(&mut self, steps: i32, paused: bool) -> Adjustment {
        let control = self.selected();
        let (min, max) = control.range();
        let current = self.value(control, paused);
        let delta = steps as i64 * control.step() as i64;
        let next = (current as i64 + delta).clamp(min as i64, max as i64) as u32;

        if next == current {
            return Adjustment::Unchanged;
        }

        // Ranges above fit in u8 for every u8-backed field.
        let p = &mut self.params;
        match control {
            Control::LowerHue => p.lower[0] = next as u8,
            Control::UpperHue => p.upper[0] = next as u8,
            Control::LowerSat => p.lower[1] = next as u8,
            Control::UpperSat => p.upper[1] = next as u8,
            Control::LowerVal => p.lower[2] = next as u8,
            Control::UpperVal => p.upper[2] = next as u8,
            Control::MinArea => p.min_area = next,
            Control::MaxArea => p.max_area = next,
            Control::Speed => p.speed_step = next as u8,
            Control::Pause => return Adjustment::TogglePause,
        }
        Adjustment::Changed
    }
}
