use std::io::{self, Read};
use std::os::unix::io::RawFd;
use std::time::Duration;
use tracing::debug;

use crate::commands::{EventSource, UserCommand};
use crate::keys::{decode_keys, ends_in_partial_escape};

const STDIN_FD: RawFd = 0;
/// How long to wait for the rest of a split escape sequence.
const ESCAPE_GRACE: Duration = Duration::from_millis(15);

/// Puts the terminal into unbuffered, no-echo mode and restores the original
/// settings on drop.
pub struct RawModeGuard {
    original: libc::termios,
}

impl RawModeGuard {
    pub fn new() -> io::Result<Self> {
        // SAFETY: termios is plain data, filled in by tcgetattr before use.
        unsafe {
            let mut original: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(STDIN_FD, &mut original) != 0 {
                return Err(io::Error::last_os_error());
            }
            let mut raw = original;
            // ISIG off so Ctrl-C arrives as a key and the guard still runs.
            raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG);
            raw.c_cc[libc::VMIN] = 1;
            raw.c_cc[libc::VTIME] = 0;
            if libc::tcsetattr(STDIN_FD, libc::TCSANOW, &raw) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self { original })
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // SAFETY: restores the settings captured in `new`.
        unsafe {
            libc::tcsetattr(STDIN_FD, libc::TCSANOW, &self.original);
        }
    }
}

/// Keyboard commands read straight from stdin with `poll(2)`.
#[derive(Debug, Default)]
pub struct TerminalEvents {
    eof: bool,
}

impl TerminalEvents {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource for TerminalEvents {
    fn poll_commands(&mut self, timeout: Duration) -> io::Result<Vec<UserCommand>> {
        if self.eof {
            std::thread::sleep(timeout);
            return Ok(Vec::new());
        }

        let mut bytes = Vec::new();
        if !wait_readable(timeout)? {
            return Ok(Vec::new());
        }
        if read_available(&mut bytes)? == 0 {
            debug!("stdin closed, keyboard input disabled");
            self.eof = true;
            return Ok(Vec::new());
        }
        while ends_in_partial_escape(&bytes) && wait_readable(ESCAPE_GRACE)? {
            if read_available(&mut bytes)? == 0 {
                self.eof = true;
                break;
            }
        }

        Ok(decode_keys(&bytes))
    }
}

fn wait_readable(timeout: Duration) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd: STDIN_FD,
        events: libc::POLLIN,
        revents: 0,
    };
    let ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;
    // SAFETY: one valid pollfd for the duration of the call.
    let ready = unsafe { libc::poll(&mut fds, 1, ms) };
    if ready < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(ready > 0)
}

fn read_available(bytes: &mut Vec<u8>) -> io::Result<usize> {
    let mut buf = [0u8; 64];
    let n = RawStdin.read(&mut buf)?;
    bytes.extend_from_slice(&buf[..n]);
    Ok(n)
}

/// Stdin without a userspace buffer.
///
/// Each read takes only what it is asked for from fd 0, so bytes typed after
/// a prompt line stay in the terminal for [`TerminalEvents`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdin;

impl Read for RawStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            // SAFETY: reads at most buf.len() bytes into a live buffer.
            let n = unsafe { libc::read(STDIN_FD, buf.as_mut_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

/// Read one prompt line from the terminal.
pub fn read_line() -> io::Result<Option<String>> {
    read_line_from(&mut RawStdin)
}

/// Read up to and including the next newline, one byte at a time.
///
/// Returns `None` at end of input when nothing was read. A final line
/// without a newline is still returned.
pub fn read_line_from<R: Read>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}
