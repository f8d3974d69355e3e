//! ANSI escape sequence stripping

use super::Filter;

/// Removes ANSI escape sequences (colors, cursor movement, titles).
///
/// An escape sequence split across two chunks is held back until its
/// terminator arrives, so it never leaks into the buffer half-stripped.
#[derive(Debug, Default)]
pub struct StripAnsi {
    pending: String,
}

/// Create a filter that strips ANSI escape sequences.
pub fn strip_ansi() -> StripAnsi {
    StripAnsi::default()
}

/// Strip complete escape sequences from `data`.
///
/// Returns the stripped text and the byte offset where an unterminated
/// trailing sequence starts, if there is one.
fn strip(data: &str) -> (String, Option<usize>) {
    let bytes = data.as_bytes();
    let mut result = String::with_capacity(data.len());
    let mut i = 0;
    let mut plain_from = 0;

    while i < bytes.len() {
        if bytes[i] != b'\x1b' {
            i += 1;
            continue;
        }

        result.push_str(&data[plain_from..i]);
        let start = i;
        if i + 1 >= bytes.len() {
            return (result, Some(start));
        }

        match bytes[i + 1] {
            b'[' => {
                // CSI: parameters up to a final letter
                i += 2;
                loop {
                    if i >= bytes.len() {
                        return (result, Some(start));
                    }
                    let ch = bytes[i];
                    i += 1;
                    if ch.is_ascii_alphabetic() || ch == b'~' || ch == b'@' {
                        break;
                    }
                }
            }
            b']' => {
                // OSC: terminated by BEL or ST (ESC \)
                i += 2;
                loop {
                    if i >= bytes.len() {
                        return (result, Some(start));
                    }
                    if bytes[i] == b'\x07' {
                        i += 1;
                        break;
                    }
                    if bytes[i] == b'\x1b' {
                        if i + 1 >= bytes.len() {
                            return (result, Some(start));
                        }
                        if bytes[i + 1] == b'\\' {
                            i += 2;
                            break;
                        }
                    }
                    i += 1;
                }
            }
            b'(' | b')' => {
                // Character set selection: ESC ( X
                if i + 2 >= bytes.len() {
                    return (result, Some(start));
                }
                i += 3;
            }
            _ => {
                i += 2;
            }
        }

        // Sequences are ASCII except possibly their last byte; step past it
        // without splitting a character.
        while !data.is_char_boundary(i) {
            i += 1;
        }
        plain_from = i;
    }

    result.push_str(&data[plain_from..]);
    (result, None)
}

impl Filter for StripAnsi {
    fn before_append(&mut self, chunk: &str, _buffer: &str) -> Option<String> {
        self.pending.push_str(chunk);
        let data = std::mem::take(&mut self.pending);
        let (stripped, unterminated) = strip(&data);
        if let Some(offset) = unterminated {
            self.pending = data[offset..].to_string();
        }
        // Always `Some`, even when everything was stripped or held back.
        Some(stripped)
    }

    fn fork(&self) -> Box<dyn Filter> {
        Box::new(StripAnsi::default())
    }
}
