use crate::commands::UserCommand;

const ESC: u8 = 27;
const CTRL_C: u8 = 3;

/// Translate raw terminal bytes into commands.
///
/// Arrow keys arrive as `ESC [ A..D` (or `ESC O A..D` in application cursor
/// mode). An ESC that does not start such a sequence is the quit key.
/// Unmapped bytes are dropped.
pub fn decode_keys(bytes: &[u8]) -> Vec<UserCommand> {
    let mut commands = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        i += 1;

        if byte == ESC {
            match (bytes.get(i), bytes.get(i + 1)) {
                (Some(b'[' | b'O'), Some(&code)) => {
                    i += 2;
                    if let Some(cmd) = arrow(code) {
                        commands.push(cmd);
                    }
                }
                _ => commands.push(UserCommand::Quit),
            }
            continue;
        }

        let cmd = match byte {
            b'q' | CTRL_C => UserCommand::Quit,
            b' ' => UserCommand::TogglePause,
            b'r' | b'R' => UserCommand::Restart,
            b'l' | b'L' => UserCommand::LoadNew,
            b'\t' | b'j' => UserCommand::SelectNext,
            b'k' => UserCommand::SelectPrev,
            b'+' | b'=' => UserCommand::Adjust(1),
            b'-' => UserCommand::Adjust(-1),
            b']' => UserCommand::Adjust(10),
            b'[' => UserCommand::Adjust(-10),
            b'm' | b'M' => UserCommand::CycleView,
            _ => continue,
        };
        commands.push(cmd);
    }

    commands
}

/// True when `bytes` ends partway through an escape sequence, so the caller
/// should wait briefly for the rest before decoding.
pub fn ends_in_partial_escape(bytes: &[u8]) -> bool {
    match bytes {
        [.., ESC] => true,
        [.., ESC, b'[' | b'O'] => true,
        _ => false,
    }
}

fn arrow(code: u8) -> Option<UserCommand> {
    match code {
        b'A' => Some(UserCommand::SelectPrev),
        b'B' => Some(UserCommand::SelectNext),
        b'C' => Some(UserCommand::Adjust(1)),
        b'D' => Some(UserCommand::Adjust(-1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use UserCommand::*;

    #[test]
    fn single_keys() {
        assert_eq!(decode_keys(b"q"), vec![Quit]);
        assert_eq!(decode_keys(b" "), vec![TogglePause]);
        assert_eq!(decode_keys(b"rR"), vec![Restart, Restart]);
        assert_eq!(decode_keys(b"lL"), vec![LoadNew, LoadNew]);
        assert_eq!(decode_keys(b"\tjk"), vec![SelectNext, SelectNext, SelectPrev]);
        assert_eq!(decode_keys(b"+=-"), vec![Adjust(1), Adjust(1), Adjust(-1)]);
        assert_eq!(decode_keys(b"]["), vec![Adjust(10), Adjust(-10)]);
        assert_eq!(decode_keys(b"m"), vec![CycleView]);
    }

    #[test]
    fn lone_escape_quits() {
        assert_eq!(decode_keys(&[27]), vec![Quit]);
        assert_eq!(decode_keys(&[27, b'r']), vec![Quit, Restart]);
    }

    #[test]
    fn arrow_sequences() {
        assert_eq!(decode_keys(b"\x1b[A"), vec![SelectPrev]);
        assert_eq!(decode_keys(b"\x1b[B"), vec![SelectNext]);
        assert_eq!(decode_keys(b"\x1b[C\x1b[D"), vec![Adjust(1), Adjust(-1)]);
        assert_eq!(decode_keys(b"\x1bOC"), vec![Adjust(1)]);
    }

    #[test]
    fn unknown_sequences_and_bytes_are_dropped() {
        assert_eq!(decode_keys(b"\x1b[H"), Vec::<UserCommand>::new());
        assert_eq!(decode_keys(b"xyz\n"), Vec::<UserCommand>::new());
        // uppercase Q is not bound
        assert_eq!(decode_keys(b"Q"), Vec::<UserCommand>::new());
    }

    #[test]
    fn ctrl_c_quits() {
        assert_eq!(decode_keys(&[3]), vec![Quit]);
    }

    #[test]
    fn partial_escape_detection() {
        assert!(ends_in_partial_escape(&[27]));
        assert!(ends_in_partial_escape(&[b'a', 27, b'[']));
        assert!(!ends_in_partial_escape(b"\x1b[A"));
        assert!(!ends_in_partial_escape(b"["));
        assert!(!ends_in_partial_escape(b""));
    }
}
