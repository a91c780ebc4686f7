//! ANSI escape sequence stripping

#[derive(Clone, Copy, PartialEq)]
enum State {
    Ground,
    Escape,
    Csi,
    Osc,
    OscEscape,
    Charset,
}

/// Strip ANSI escape sequences from a byte slice.
///
/// Removes CSI sequences (`ESC [ ... <letter>`), OSC sequences
/// (`ESC ] ... BEL` or `ESC ] ... ESC \`), charset designations
/// (`ESC ( X`, `ESC ) X`) and other two-byte escapes.
pub fn strip_ansi(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut state = State::Ground;

    for &byte in data {
        state = match state {
            State::Ground => {
                if byte == b'\x1b' {
                    State::Escape
                } else {
                    out.push(byte);
                    State::Ground
                }
            }
            State::Escape => match byte {
                b'[' => State::Csi,
                b']' => State::Osc,
                b'(' | b')' => State::Charset,
                // two-byte escape: the byte after ESC is the whole sequence
                _ => State::Ground,
            },
            State::Csi => {
                // parameter and intermediate bytes run until a final letter
                if byte.is_ascii_alphabetic() {
                    State::Ground
                } else {
                    State::Csi
                }
            }
            State::Osc => match byte {
                b'\x07' => State::Ground,
                b'\x1b' => State::OscEscape,
                _ => State::Osc,
            },
            State::OscEscape => {
                if byte == b'\\' {
                    State::Ground
                } else {
                    // lone ESC inside an OSC string; stay in the string
                    State::Osc
                }
            }
            State::Charset => State::Ground,
        };
    }

    out
}
