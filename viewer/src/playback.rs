//! Per-video playback state machine.
//!
//! One [`Player`] owns one open source. Each [`Player::tick`] decodes at most
//! one frame, shows it, then waits up to the speed-scaled delay for keyboard
//! commands.

use capscan_common::config::Config;
use capscan_common::frame::Frame;
use capscan_common::video::{FrameSource, SourceError};
use capscan_vision::{annotate, detect_stages, DetectionParameters};
use image::{DynamicImage, RgbImage};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::commands::{EventSource, UserCommand};
use crate::controls::{Adjustment, ControlPanel};
use crate::display::{DisplayError, FrameDisplay};
use crate::panel::{draw_panel, PanelStatus};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("video source failed: {0}")]
    Source(#[from] SourceError),
    #[error("display failed: {0}")]
    Display(#[from] DisplayError),
    #[error("keyboard input failed: {0}")]
    Input(#[from] io::Error),
}

/// What the display shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Annotated,
    Mask,
    Cleaned,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::Annotated => ViewMode::Mask,
            ViewMode::Mask => ViewMode::Cleaned,
            ViewMode::Cleaned => ViewMode::Annotated,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Annotated => "ANNOTATED",
            ViewMode::Mask => "MASK",
            ViewMode::Cleaned => "CLEANED",
        }
    }
}

/// Settings that outlive a single video.
#[derive(Debug, Clone)]
pub struct Session {
    pub panel: ControlPanel,
    pub view: ViewMode,
    pub show_panel: bool,
    pub base_delay_ms: u64,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            panel: ControlPanel::new(DetectionParameters::new(&config.detection, &config.playback)),
            view: ViewMode::default(),
            show_panel: config.playback.show_panel,
            base_delay_ms: config.playback.base_delay_ms,
        }
    }
}

/// State of the video currently loaded. Created fresh for every source.
#[derive(Debug)]
pub struct PlaybackState {
    pub source_path: PathBuf,
    pub paused: bool,
    /// Most recently decoded frame, redisplayed while paused.
    pub last_frame: Option<Frame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The source ran out of frames.
    Finished,
    LoadNew,
    Quit,
}

pub struct Player<S> {
    source: S,
    state: PlaybackState,
}

impl<S: FrameSource> Player<S> {
    pub fn new(source: S, source_path: PathBuf) -> Self {
        Self {
            source,
            state: PlaybackState {
                source_path,
                paused: false,
                last_frame: None,
            },
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Tick until something other than [`TickOutcome::Continue`] happens.
    pub fn run<D, E>(&mut self, session: &mut Session, display: &mut D, events: &mut E) -> Result<TickOutcome, PlaybackError>
    where
        D: FrameDisplay,
        E: EventSource,
    {
        loop {
            match self.tick(session, display, events)? {
                TickOutcome::Continue => {}
                outcome => return Ok(outcome),
            }
        }
    }

    pub fn tick<D, E>(&mut self, session: &mut Session, display: &mut D, events: &mut E) -> Result<TickOutcome, PlaybackError>
    where
        D: FrameDisplay,
        E: EventSource,
    {
        if !self.state.paused {
            match self.source.next_frame()? {
                Some(frame) => self.state.last_frame = Some(frame),
                None => {
                    info!(path = %self.state.source_path.display(), "video finished");
                    return Ok(TickOutcome::Finished);
                }
            }
        }

        if let Some(frame) = &self.state.last_frame {
            let image = render_view(&frame.image, session, self.state.paused);
            match display.show(&image) {
                Ok(()) => {}
                Err(DisplayError::Closed) => {
                    info!("display closed, quitting");
                    return Ok(TickOutcome::Quit);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let delay = session.panel.params.frame_delay(session.base_delay_ms);
        for command in events.poll_commands(delay)? {
            if let Some(outcome) = self.handle_command(command, session)? {
                return Ok(outcome);
            }
        }
        Ok(TickOutcome::Continue)
    }

    fn handle_command(&mut self, command: UserCommand, session: &mut Session) -> Result<Option<TickOutcome>, PlaybackError> {
        match command {
            UserCommand::Quit => return Ok(Some(TickOutcome::Quit)),
            UserCommand::LoadNew => return Ok(Some(TickOutcome::LoadNew)),
            UserCommand::TogglePause => self.toggle_pause(),
            UserCommand::Restart => {
                self.source.rewind()?;
                info!("video restarted from beginning");
            }
            UserCommand::SelectNext => {
                session.panel.select_next();
                debug!(control = session.panel.selected().label(), "selected control");
            }
            UserCommand::SelectPrev => {
                session.panel.select_prev();
                debug!(control = session.panel.selected().label(), "selected control");
            }
            UserCommand::Adjust(steps) => match session.panel.adjust(steps, self.state.paused) {
                Adjustment::TogglePause => self.toggle_pause(),
                Adjustment::Changed => {
                    let control = session.panel.selected();
                    debug!(
                        control = control.label(),
                        value = session.panel.value(control, self.state.paused),
                        "control adjusted"
                    );
                }
                Adjustment::Unchanged => {}
            },
            UserCommand::CycleView => {
                session.view = session.view.next();
                info!(view = session.view.label(), "view changed");
            }
        }
        Ok(None)
    }

    fn toggle_pause(&mut self) {
        self.state.paused = !self.state.paused;
        if self.state.paused {
            info!("video paused");
        } else {
            info!("video playing");
        }
    }
}

/// Run detection on `frame` and build the image for the current view.
fn render_view(frame: &RgbImage, session: &Session, paused: bool) -> RgbImage {
    let stages = detect_stages(frame, &session.panel.params);
    let cap_count = stages.blobs.len();

    let mut image = match session.view {
        ViewMode::Annotated => annotate(frame, &stages.blobs),
        ViewMode::Mask => DynamicImage::ImageLuma8(stages.mask).into_rgb8(),
        ViewMode::Cleaned => DynamicImage::ImageLuma8(stages.cleaned).into_rgb8(),
    };

    if session.show_panel {
        let status = PanelStatus {
            paused,
            cap_count,
            view: session.view,
        };
        draw_panel(&mut image, &session.panel, &status);
    }
    image
}
