//! Incremental character decoding of raw input chunks

use bytes::{Buf, BytesMut};

/// Character encoding used to turn raw bytes into text and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8; invalid sequences decode to U+FFFD.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    /// Encode outgoing text.
    ///
    /// Characters Latin-1 cannot represent are sent as `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }
}

/// Stateful decoder for one input stream.
///
/// A multi-byte character split across reads is kept in `pending` until
/// the rest of it arrives.
#[derive(Debug)]
pub(crate) struct Decoder {
    encoding: Encoding,
    pending: BytesMut,
}

impl Decoder {
    pub(crate) fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            pending: BytesMut::new(),
        }
    }

    /// Decode a chunk, holding back an incomplete trailing character.
    pub(crate) fn decode(&mut self, data: &[u8]) -> String {
        match self.encoding {
            Encoding::Latin1 => data.iter().map(|&b| char::from(b)).collect(),
            Encoding::Utf8 => {
                self.pending.extend_from_slice(data);
                let mut text = String::with_capacity(self.pending.len());

                loop {
                    match std::str::from_utf8(&self.pending) {
                        Ok(valid) => {
                            text.push_str(valid);
                            self.pending.clear();
                            break;
                        }
                        Err(e) => {
                            let valid_up_to = e.valid_up_to();
                            text.push_str(&String::from_utf8_lossy(&self.pending[..valid_up_to]));
                            match e.error_len() {
                                Some(len) => {
                                    text.push(char::REPLACEMENT_CHARACTER);
                                    self.pending.advance(valid_up_to + len);
                                }
                                None => {
                                    // Incomplete sequence at the end: wait for more bytes
                                    self.pending.advance(valid_up_to);
                                    break;
                                }
                            }
                        }
                    }
                }

                text
            }
        }
    }

    /// Flush whatever is held back once the stream has ended.
    pub(crate) fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}
