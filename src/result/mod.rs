//! Result types for expect operations

mod error;

pub use error::{ExpectError, PatternError};

use std::fmt;
use std::ops::Deref;

/// Outcome of a single match attempt.
///
/// A `MatchResult` is created fresh by every matcher invocation. Besides the
/// success flag it always carries the text that was examined (`input`), which
/// is the main diagnostic when a match fails. All other attributes describe the
/// match itself and are only defined on success; reading them from an
/// unsuccessful result fails with [`ExpectError::NoResult`].
///
/// Offsets are byte offsets into `input`.
///
/// # Examples
///
/// ```no_run
/// use multiexpect::{matcher::regexp, Expect};
///
/// # async fn example(expect: &mut Expect) -> Result<(), Box<dyn std::error::Error>> {
/// let result = expect.expect(regexp(r"(\w+)@(\w+)\.(\w+)")?).await?;
/// if result.is_successful() {
///     println!("Email: {}", result.group()?);
///     println!("User: {:?}", result.group_at(1)?);
///     println!("Before: {}", result.before()?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    successful: bool,
    input: String,
    before: String,
    start: usize,
    end: usize,
    /// Index 0 is the whole match, 1.. are capture groups.
    groups: Vec<Option<String>>,
    can_stop_matching: bool,
}

impl MatchResult {
    /// Create a successful result.
    ///
    /// `groups[0]` must be the matched text; further entries are capture
    /// groups. An empty `groups` is treated as an empty match.
    pub fn success(
        input: impl Into<String>,
        before: impl Into<String>,
        start: usize,
        end: usize,
        groups: Vec<Option<String>>,
    ) -> Self {
        let groups = if groups.is_empty() {
            vec![Some(String::new())]
        } else {
            groups
        };
        Self {
            successful: true,
            input: input.into(),
            before: before.into(),
            start,
            end,
            groups,
            can_stop_matching: true,
        }
    }

    /// Create an unsuccessful result.
    ///
    /// `can_stop_matching` tells the engine that no further input can turn
    /// this failure into a success, so it may stop waiting.
    pub fn failure(input: impl Into<String>, can_stop_matching: bool) -> Self {
        Self {
            successful: false,
            input: input.into(),
            before: String::new(),
            start: 0,
            end: 0,
            groups: Vec::new(),
            can_stop_matching,
        }
    }

    /// Successful result for a plain text match at `start..end` of `input`.
    pub(crate) fn spanning(input: &str, start: usize, end: usize) -> Self {
        Self::success(
            input,
            &input[..start],
            start,
            end,
            vec![Some(input[start..end].to_string())],
        )
    }

    /// Whether the match succeeded.
    pub fn is_successful(&self) -> bool {
        self.successful
    }

    /// The exact text that was examined when this result was produced.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Whether the engine may stop polling for more input.
    pub fn can_stop_matching(&self) -> bool {
        self.can_stop_matching
    }

    /// Text preceding the match.
    pub fn before(&self) -> Result<&str, ExpectError> {
        self.check()?;
        Ok(&self.before)
    }

    /// Offset where the match starts.
    pub fn start(&self) -> Result<usize, ExpectError> {
        self.check()?;
        Ok(self.start)
    }

    /// Offset right after the match; the engine consumes `input[..end]`.
    pub fn end(&self) -> Result<usize, ExpectError> {
        self.check()?;
        Ok(self.end)
    }

    /// The whole matched text (group 0).
    pub fn group(&self) -> Result<&str, ExpectError> {
        self.check()?;
        Ok(self.groups[0].as_deref().unwrap_or_default())
    }

    /// Capture group `index`; `None` if the group did not participate.
    ///
    /// Index 0 is the whole match. An index above [`group_count`] is an
    /// invalid argument.
    ///
    /// [`group_count`]: MatchResult::group_count
    pub fn group_at(&self, index: usize) -> Result<Option<&str>, ExpectError> {
        self.check()?;
        self.groups
            .get(index)
            .map(|g| g.as_deref())
            .ok_or_else(|| {
                ExpectError::invalid(format!(
                    "group {} out of range ({} groups)",
                    index,
                    self.groups.len() - 1
                ))
            })
    }

    /// Number of capture groups, not counting the whole match.
    pub fn group_count(&self) -> Result<usize, ExpectError> {
        self.check()?;
        Ok(self.groups.len() - 1)
    }

    /// End offset for the engine, `None` on failure.
    pub(crate) fn matched_end(&self) -> Option<usize> {
        self.successful.then_some(self.end)
    }

    /// Re-express a result computed on `input[offset..]` against the whole `input`.
    pub(crate) fn rebased(self, input: &str, offset: usize) -> Self {
        if !self.successful {
            return Self {
                input: input.to_string(),
                ..self
            };
        }
        let start = self.start + offset;
        Self {
            successful: true,
            input: input.to_string(),
            before: input[..start].to_string(),
            start,
            end: self.end + offset,
            groups: self.groups,
            can_stop_matching: self.can_stop_matching,
        }
    }

    fn check(&self) -> Result<(), ExpectError> {
        if self.successful {
            Ok(())
        } else {
            Err(ExpectError::NoResult)
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.successful {
            write!(
                f,
                "match {:?} at {}..{}",
                self.groups[0].as_deref().unwrap_or_default(),
                self.start,
                self.end
            )
        } else {
            write!(f, "no match in {:?}", self.input)
        }
    }
}

/// A result composed from the ordered results of several matchers.
///
/// The sub-results are kept in declaration order. The composite itself
/// behaves like its *representative* result, chosen by the combinator's
/// tie-break rule, and dereferences to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiResult {
    representative: MatchResult,
    results: Vec<MatchResult>,
}

impl MultiResult {
    /// Create a composite result.
    pub fn new(representative: MatchResult, results: Vec<MatchResult>) -> Self {
        Self {
            representative,
            results,
        }
    }

    /// Sub-results in declaration order.
    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    /// The result selected by the combinator's tie-break rule.
    pub fn representative(&self) -> &MatchResult {
        &self.representative
    }
}

impl Deref for MultiResult {
    type Target = MatchResult;

    fn deref(&self) -> &MatchResult {
        &self.representative
    }
}

/// Common view over [`MatchResult`] and [`MultiResult`].
///
/// Every matcher output implements `Outcome`, which is how the engine reads
/// the success flag and the consumed span regardless of the concrete type.
pub trait Outcome: fmt::Debug + Clone + Send + 'static {
    /// The single result that stands for this outcome.
    fn result(&self) -> &MatchResult;

    /// Collapse into the representative result.
    fn into_result(self) -> MatchResult;
}

impl Outcome for MatchResult {
    fn result(&self) -> &MatchResult {
        self
    }

    fn into_result(self) -> MatchResult {
        self
    }
}

impl Outcome for MultiResult {
    fn result(&self) -> &MatchResult {
        &self.representative
    }

    fn into_result(self) -> MatchResult {
        self.representative
    }
}
