//! Rewriting filters

use super::Filter;
use crate::result::PatternError;
use regex::Regex;

/// Replaces regex matches in each incoming chunk, see [`replace_in_chunk`].
#[derive(Debug, Clone)]
pub struct ReplaceInChunk {
    regex: Regex,
    replacement: String,
}

/// Replace every match of `pattern` in each chunk before it is appended.
///
/// `replacement` may reference capture groups as `$1` or `${name}`.
/// Matches spanning two chunks are not seen; use [`replace_in_buffer`]
/// for those.
pub fn replace_in_chunk(
    pattern: &str,
    replacement: impl Into<String>,
) -> Result<ReplaceInChunk, PatternError> {
    Ok(ReplaceInChunk {
        regex: Regex::new(pattern)?,
        replacement: replacement.into(),
    })
}

impl Filter for ReplaceInChunk {
    fn before_append(&mut self, chunk: &str, _buffer: &str) -> Option<String> {
        Some(
            self.regex
                .replace_all(chunk, self.replacement.as_str())
                .into_owned(),
        )
    }

    fn fork(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

/// Replaces regex matches in the whole buffer, see [`replace_in_buffer`].
#[derive(Debug, Clone)]
pub struct ReplaceInBuffer {
    regex: Regex,
    replacement: String,
}

/// Replace every match of `pattern` in the buffer after each append.
pub fn replace_in_buffer(
    pattern: &str,
    replacement: impl Into<String>,
) -> Result<ReplaceInBuffer, PatternError> {
    Ok(ReplaceInBuffer {
        regex: Regex::new(pattern)?,
        replacement: replacement.into(),
    })
}

impl Filter for ReplaceInBuffer {
    fn before_append(&mut self, chunk: &str, _buffer: &str) -> Option<String> {
        Some(chunk.to_string())
    }

    fn after_append(&mut self, buffer: &mut String) -> bool {
        if self.regex.is_match(buffer) {
            *buffer = self
                .regex
                .replace_all(buffer, self.replacement.as_str())
                .into_owned();
        }
        false
    }

    fn fork(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

/// Drops control characters, see [`remove_non_printable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveNonPrintable;

/// Remove control characters other than `\n`, `\r` and `\t`.
pub fn remove_non_printable() -> RemoveNonPrintable {
    RemoveNonPrintable
}

impl Filter for RemoveNonPrintable {
    fn before_append(&mut self, chunk: &str, _buffer: &str) -> Option<String> {
        Some(
            chunk
                .chars()
                .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
                .collect(),
        )
    }

    fn fork(&self) -> Box<dyn Filter> {
        Box::new(*self)
    }
}

/// Line buffering, see [`lines`].
#[derive(Debug, Default)]
pub struct Lines {
    partial: String,
}

/// Hold back a partial line until its `\n` arrives.
///
/// Only complete lines reach the buffer. Anything still held when the
/// stream ends is never appended.
pub fn lines() -> Lines {
    Lines::default()
}

impl Filter for Lines {
    fn before_append(&mut self, chunk: &str, _buffer: &str) -> Option<String> {
        self.partial.push_str(chunk);
        let Some(newline) = self.partial.rfind('\n') else {
            return Some(String::new());
        };
        let rest = self.partial.split_off(newline + 1);
        Some(std::mem::replace(&mut self.partial, rest))
    }

    fn fork(&self) -> Box<dyn Filter> {
        Box::new(Lines::default())
    }
}
