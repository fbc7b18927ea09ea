//! The outer prompt / play / finished loop around [`Player`].

use capscan_common::config::Config;
use capscan_common::video::{FfmpegSource, FrameSource, SourceError};
use capscan_vision::params::SPEED_STEP_MAX;
use capscan_vision::DetectionParameters;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::display::{display_rate, DisplayError, FfplayDisplay};
use crate::playback::{PlaybackError, Player, Session, TickOutcome};
use crate::terminal::{self, RawModeGuard, TerminalEvents};

const PROMPT: &str = "Enter video file path (or 'quit' to exit): ";
const FINISHED_PROMPT: &str = "Video finished. Load another? (Enter path or 'quit'): ";

#[derive(Debug, Error)]
enum SessionError {
    #[error("failed to open video: {0}")]
    Open(#[from] SourceError),
    #[error("failed to open display: {0}")]
    Display(#[from] DisplayError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAnswer {
    Quit,
    Open(PathBuf),
    /// Blank line, ask again.
    Empty,
}

/// Interpret one line typed at the prompt.
pub fn parse_prompt_answer(line: &str) -> PromptAnswer {
    let trimmed = line.trim();
    match trimmed {
        "" => PromptAnswer::Empty,
        "quit" | "q" => PromptAnswer::Quit,
        _ => {
            // Paths dragged into a terminal often arrive quoted.
            let unquoted = ['"', '\'']
                .iter()
                .find_map(|q| trimmed.strip_prefix(*q).and_then(|s| s.strip_suffix(*q)))
                .unwrap_or(trimmed);
            PromptAnswer::Open(PathBuf::from(unquoted))
        }
    }
}

/// Run the interactive viewer until the user quits or stdin closes.
pub fn run(config: &Config, initial: Option<PathBuf>) {
    let mut session = Session::new(config);
    let mut next = initial;
    let mut prompt = PROMPT;

    loop {
        let path = match next.take() {
            Some(path) => path,
            None => match ask(prompt) {
                Some(path) => path,
                None => break,
            },
        };
        prompt = PROMPT;

        match play(config, &mut session, &path) {
            Ok(TickOutcome::Finished) => prompt = FINISHED_PROMPT,
            Ok(TickOutcome::LoadNew) => info!("loading new video"),
            Ok(TickOutcome::Quit) => break,
            Ok(TickOutcome::Continue) => {}
            Err(SessionError::Open(e)) => {
                warn!(path = %path.display(), error = %e, "could not open video");
                eprintln!("failed to open video: {} ({e})", path.display());
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "playback stopped");
                eprintln!("{e}");
            }
        }
    }

    info!("exiting");
}

/// Prompt on stdout until a path or quit arrives. `None` means quit or EOF.
fn ask(prompt: &str) -> Option<PathBuf> {
    let mut prompt = prompt;
    loop {
        print!("{prompt}");
        let _ = io::stdout().flush();

        let line = match terminal::read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                println!();
                return None;
            }
            Err(e) => {
                error!(error = %e, "failed to read from stdin");
                return None;
            }
        };

        match parse_prompt_answer(&line) {
            PromptAnswer::Quit => return None,
            PromptAnswer::Open(path) => return Some(path),
            PromptAnswer::Empty => prompt = PROMPT,
        }
    }
}

/// Open `path`, play it to an outcome, and release the source, the display
/// and the terminal on the way out.
fn play(config: &Config, session: &mut Session, path: &Path) -> Result<TickOutcome, SessionError> {
    let source = FfmpegSource::open(path, &config.tools)?;
    let (width, height) = source.dimensions();
    let fastest = DetectionParameters {
        speed_step: SPEED_STEP_MAX,
        ..session.panel.params.clone()
    };
    let mut display = FfplayDisplay::open(
        &config.tools.ffplay,
        &config.playback.window_title,
        width,
        height,
        display_rate(fastest.frame_delay(session.base_delay_ms)),
    )?;
    debug!(source_fps = ?source.info().fps, width, height, "video opened");

    println!("Playing: {}", path.display());
    print_controls();

    let _raw = match RawModeGuard::new() {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!(error = %e, "stdin is not a terminal, keys need Enter to register");
            None
        }
    };
    let mut events = TerminalEvents::new();
    let mut player = Player::new(source, path.to_path_buf());
    let outcome = player.run(session, &mut display, &mut events)?;
    debug!(
        path = %player.state().source_path.display(),
        ?outcome,
        paused = player.state().paused,
        "playback ended"
    );
    Ok(outcome)
}

fn print_controls() {
    println!("Controls (type keys in this terminal, not the video window):");
    println!("  SPACE      - Pause/Resume");
    println!("  'r'        - Restart video from beginning");
    println!("  'l'        - Load new video file");
    println!("  ESC or 'q' - Quit application");
    println!("  TAB/j/k    - Select control (arrows work too)");
    println!("  +/- and ]/[ - Adjust selected control by 1 or 10 steps");
    println!("  'm'        - Cycle view: annotated, mask, cleaned mask");
}
