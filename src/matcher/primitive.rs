//! Primitive matcher implementations

use super::search::Finder;
use super::Matcher;
use crate::result::{MatchResult, PatternError};
use globset::Glob as GlobPattern;
use regex::{Captures, Regex};
use std::fmt;

/// Failure for a primitive matcher: once the stream has ended nothing can change.
fn miss(input: &str, is_eof: bool) -> MatchResult {
    MatchResult::failure(input, is_eof)
}

fn capture_groups(captures: &Captures<'_>) -> Vec<Option<String>> {
    captures
        .iter()
        .map(|group| group.map(|m| m.as_str().to_string()))
        .collect()
}

/// Substring matcher, see [`contains`].
#[derive(Debug, Clone)]
pub struct Contains {
    needle: String,
    finder: Finder,
}

/// Succeeds if `needle` occurs anywhere in the input.
///
/// `before` is the text up to the first occurrence; there are no capture
/// groups and [`group`](MatchResult::group) is the needle itself.
pub fn contains(needle: impl Into<String>) -> Contains {
    let needle = needle.into();
    let finder = Finder::new(needle.as_bytes());
    Contains { needle, finder }
}

impl Matcher for Contains {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        match self.finder.find(input.as_bytes()) {
            Some(start) => MatchResult::spanning(input, start, start + self.needle.len()),
            None => miss(input, is_eof),
        }
    }
}

impl fmt::Display for Contains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contains({:?})", self.needle)
    }
}

/// Anchored regex matcher, see [`matches`].
#[derive(Debug, Clone)]
pub struct FullMatch {
    pattern: String,
    regex: Regex,
}

/// Succeeds if the *entire* input matches `pattern`.
///
/// On success the whole buffer is consumed and `before` is empty.
pub fn matches(pattern: &str) -> Result<FullMatch, PatternError> {
    Ok(FullMatch {
        pattern: pattern.to_string(),
        regex: Regex::new(&format!(r"\A(?:{})\z", pattern))?,
    })
}

impl Matcher for FullMatch {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        match self.regex.captures(input) {
            Some(captures) => {
                MatchResult::success(input, "", 0, input.len(), capture_groups(&captures))
            }
            None => miss(input, is_eof),
        }
    }
}

impl fmt::Display for FullMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matches({:?})", self.pattern)
    }
}

/// Unanchored regex matcher, see [`regexp`].
#[derive(Debug, Clone)]
pub struct Regexp {
    regex: Regex,
}

/// Succeeds if `pattern` is found anywhere in the input.
///
/// `before` is the text up to the match start and capture groups follow
/// the regex.
///
/// # Errors
///
/// Returns a pattern error if `pattern` is not a valid regex.
///
/// # Examples
///
/// ```
/// use multiexpect::matcher::{regexp, Matcher};
///
/// let result = regexp("a(.)b(.)c(.)").unwrap().match_input("a1b2c3", false);
/// assert_eq!(result.group_count().unwrap(), 3);
/// assert_eq!(result.group_at(1).unwrap(), Some("1"));
/// ```
pub fn regexp(pattern: &str) -> Result<Regexp, PatternError> {
    Ok(Regexp {
        regex: Regex::new(pattern)?,
    })
}

impl From<Regex> for Regexp {
    fn from(regex: Regex) -> Self {
        Regexp { regex }
    }
}

impl Matcher for Regexp {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        let Some(captures) = self.regex.captures(input) else {
            return miss(input, is_eof);
        };
        let Some(whole) = captures.get(0) else {
            return miss(input, is_eof);
        };
        MatchResult::success(
            input,
            &input[..whole.start()],
            whole.start(),
            whole.end(),
            capture_groups(&captures),
        )
    }
}

impl fmt::Display for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "regexp({:?})", self.regex.as_str())
    }
}

/// End-of-stream matcher, see [`eof`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Eof;

/// Succeeds once the input stream has ended.
///
/// `before` is everything that was left in the buffer, which is consumed.
pub fn eof() -> Eof {
    Eof
}

impl Matcher for Eof {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        if is_eof {
            MatchResult::success(input, input, input.len(), input.len(), Vec::new())
        } else {
            MatchResult::failure(input, false)
        }
    }
}

impl fmt::Display for Eof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("eof()")
    }
}

/// Non-empty input matcher, see [`any_string`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyString;

/// Succeeds as soon as the buffer holds at least one character.
///
/// The match covers the whole buffer.
pub fn any_string() -> AnyString {
    AnyString
}

impl Matcher for AnyString {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        if input.is_empty() {
            miss(input, is_eof)
        } else {
            MatchResult::spanning(input, 0, input.len())
        }
    }
}

impl fmt::Display for AnyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any_string()")
    }
}

/// Whole-buffer equality matcher, see [`exact`].
#[derive(Debug, Clone)]
pub struct Exact {
    text: String,
}

/// Succeeds if the buffer is exactly `text`.
pub fn exact(text: impl Into<String>) -> Exact {
    Exact { text: text.into() }
}

impl Matcher for Exact {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        if input == self.text {
            MatchResult::spanning(input, 0, input.len())
        } else {
            // The buffer only grows, so once it no longer starts with the
            // expected text it can never become equal to it.
            miss(input, is_eof || !self.text.starts_with(input))
        }
    }
}

impl fmt::Display for Exact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exact({:?})", self.text)
    }
}

/// Prefix matcher, see [`starts_with`].
#[derive(Debug, Clone)]
pub struct StartsWith {
    prefix: String,
}

/// Succeeds if the buffer starts with `prefix`; the prefix is consumed.
pub fn starts_with(prefix: impl Into<String>) -> StartsWith {
    StartsWith {
        prefix: prefix.into(),
    }
}

impl Matcher for StartsWith {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        if input.starts_with(&self.prefix) {
            MatchResult::spanning(input, 0, self.prefix.len())
        } else {
            miss(input, is_eof || !self.prefix.starts_with(input))
        }
    }
}

impl fmt::Display for StartsWith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "starts_with({:?})", self.prefix)
    }
}

/// Glob pattern matcher, see [`glob`].
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    regex: Regexp,
}

/// Succeeds on the first substring matching the shell-style `pattern`.
///
/// The glob is compiled to a regex and searched like [`regexp`]: the
/// earliest match wins and `*` is greedy. Wildcards and classes match
/// whole characters, and `*` does not cross a newline.
///
/// # Errors
///
/// Returns a pattern error if `pattern` is not a valid glob.
pub fn glob(pattern: &str) -> Result<Glob, PatternError> {
    let compiled = GlobPattern::new(pattern)
        .map_err(|e| PatternError::InvalidGlob(e.to_string()))?;
    let regex = Regex::new(&text_regex(compiled.regex()))?;

    Ok(Glob {
        pattern: pattern.to_string(),
        regex: Regexp::from(regex),
    })
}

/// Turn globset's anchored byte-oriented regex into an unanchored one
/// over text.
///
/// globset escapes non-ASCII literals byte by byte (`\xe4\xb8\x96`);
/// those runs are decoded back into characters.
fn text_regex(byte_regex: &str) -> String {
    let body = byte_regex.strip_prefix("(?-u)").unwrap_or(byte_regex);
    let body = body.strip_prefix('^').unwrap_or(body);
    let body = body.strip_suffix('$').unwrap_or(body);

    let mut out = String::with_capacity(body.len());
    let mut pending = Vec::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_literal(&mut out, &mut pending);
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        if escaped == 'x' {
            let hex: String = chars.by_ref().take(2).collect();
            if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                pending.push(byte);
                continue;
            }
            flush_literal(&mut out, &mut pending);
            out.push_str("\\x");
            out.push_str(&hex);
            continue;
        }
        flush_literal(&mut out, &mut pending);
        out.push('\\');
        out.push(escaped);
    }
    flush_literal(&mut out, &mut pending);
    out
}

fn flush_literal(out: &mut String, pending: &mut Vec<u8>) {
    if !pending.is_empty() {
        out.push_str(&regex::escape(&String::from_utf8_lossy(pending)));
        pending.clear();
    }
}

impl Matcher for Glob {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        self.regex.match_input(input, is_eof)
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "glob({:?})", self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let result = contains("b2").match_input("a1b2c3_", false);
        assert!(result.is_successful());
        assert_eq!(result.before().unwrap(), "a1");
        assert_eq!(result.group().unwrap(), "b2");
        assert_eq!(result.group_count().unwrap(), 0);
        assert_eq!(result.end().unwrap(), 4);
    }

    #[test]
    fn test_contains_miss() {
        let result = contains("zz").match_input("a1b2", false);
        assert!(!result.is_successful());
        assert!(!result.can_stop_matching());
        assert_eq!(result.input(), "a1b2");

        let at_eof = contains("zz").match_input("a1b2", true);
        assert!(at_eof.can_stop_matching());
    }

    #[test]
    fn test_matches_is_anchored() {
        let m = matches("a.c").unwrap();
        assert!(!m.match_input("xabc", false).is_successful());
        assert!(!m.match_input("abcx", false).is_successful());

        let result = m.match_input("abc", false);
        assert!(result.is_successful());
        assert_eq!(result.before().unwrap(), "");
        assert_eq!(result.end().unwrap(), 3);
    }

    #[test]
    fn test_matches_alternation_stays_anchored() {
        let m = matches("a|b").unwrap();
        assert!(!m.match_input("ab", false).is_successful());
        assert!(m.match_input("b", false).is_successful());
    }

    #[test]
    fn test_regexp_groups() {
        let result = regexp("a(.)b(.)c(.)")
            .unwrap()
            .match_input("xa1b2c3y", false);
        assert_eq!(result.group_count().unwrap(), 3);
        assert_eq!(result.group().unwrap(), "a1b2c3");
        assert_eq!(result.group_at(1).unwrap(), Some("1"));
        assert_eq!(result.group_at(3).unwrap(), Some("3"));
        assert_eq!(result.before().unwrap(), "x");
        assert_eq!(result.start().unwrap(), 1);
        assert_eq!(result.end().unwrap(), 7);
    }

    #[test]
    fn test_regexp_optional_group() {
        let result = regexp("a(x)?b").unwrap().match_input("ab", false);
        assert_eq!(result.group_at(1).unwrap(), None);
    }

    #[test]
    fn test_regexp_invalid() {
        assert!(regexp("(unclosed").is_err());
    }

    #[test]
    fn test_eof() {
        assert!(!eof().match_input("abc", false).is_successful());
        assert!(!eof().match_input("abc", false).can_stop_matching());

        let result = eof().match_input("abc", true);
        assert!(result.is_successful());
        assert_eq!(result.before().unwrap(), "abc");
        assert_eq!(result.end().unwrap(), 3);
    }

    #[test]
    fn test_any_string() {
        assert!(!any_string().match_input("", false).is_successful());
        let result = any_string().match_input("xyz", false);
        assert_eq!(result.group().unwrap(), "xyz");
        assert_eq!(result.end().unwrap(), 3);
    }

    #[test]
    fn test_exact() {
        let m = exact("abc");
        assert!(m.match_input("abc", false).is_successful());

        let partial = m.match_input("ab", false);
        assert!(!partial.is_successful());
        assert!(!partial.can_stop_matching());

        let diverged = m.match_input("abd", false);
        assert!(diverged.can_stop_matching());
    }

    #[test]
    fn test_starts_with() {
        let result = starts_with("$ ").match_input("$ ls", false);
        assert_eq!(result.end().unwrap(), 2);
        assert!(starts_with("$ ").match_input("# ls", false).can_stop_matching());
    }

    #[test]
    fn test_glob() {
        let result = glob("f*.txt").unwrap().match_input("see file.txt here", false);
        assert!(result.is_successful());
        assert_eq!(result.group().unwrap(), "file.txt");
        assert_eq!(result.before().unwrap(), "see ");
    }

    #[test]
    fn test_glob_utf8_boundaries() {
        let result = glob("世?").unwrap().match_input("hi 世界!", false);
        assert_eq!(result.group().unwrap(), "世界");
    }

    #[test]
    fn test_glob_class() {
        let result = glob("[0-9][0-9]%").unwrap().match_input("progress 42% done", false);
        assert_eq!(result.group().unwrap(), "42%");
        assert_eq!(result.before().unwrap(), "progress ");
        assert!(!glob("[0-9]%").unwrap().match_input("no digits", false).is_successful());
    }

    #[test]
    fn test_glob_large_buffer() {
        let mut input = "x".repeat(50_000);
        input.push_str(" exit code 3");
        let result = glob("code ?").unwrap().match_input(&input, false);
        assert_eq!(result.group().unwrap(), "code 3");
    }

    #[test]
    fn test_text_regex_decodes_escaped_bytes() {
        assert_eq!(text_regex("(?-u)^\\xe4\\xb8\\x96.$"), "世.");
        assert_eq!(text_regex("(?-u)^a\\$$"), "a\\$");
        assert_eq!(text_regex("(?-u)^\\\\x41$"), "\\\\x41");
    }

    #[test]
    fn test_display() {
        assert_eq!(contains("x").to_string(), "contains(\"x\")");
        assert_eq!(regexp("a+").unwrap().to_string(), "regexp(\"a+\")");
        assert_eq!(eof().to_string(), "eof()");
    }
}
