use std::io;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Quit,
    TogglePause,
    Restart,
    LoadNew,
    SelectNext,
    SelectPrev,
    /// Move the selected control by this many of its steps.
    Adjust(i32),
    CycleView,
}

/// Where playback commands come from.
pub trait EventSource {
    /// Block for at most `timeout` waiting for input and return whatever
    /// commands arrived, possibly none.
    fn poll_commands(&mut self, timeout: Duration) -> io::Result<Vec<UserCommand>>;
}
