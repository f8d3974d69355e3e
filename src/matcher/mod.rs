//! Matchers: pure predicates over the accumulated input
//!
//! A matcher looks at the text accumulated for one input plus the
//! end-of-stream flag and produces an [`Outcome`]. Matchers hold no mutable
//! state, so the engine can call them again every time the buffer grows.
//!
//! Primitive matchers produce a [`MatchResult`]; combinators produce a
//! [`MultiResult`](crate::MultiResult) that keeps every sub-result.
//!
//! ```
//! use multiexpect::matcher::{all_of, contains, regexp, Matcher, MatcherExt};
//!
//! let m = all_of(vec![contains("a").boxed(), regexp("b(.)").unwrap().boxed()]).unwrap();
//! let result = m.match_input("a1b2", false);
//! assert!(result.is_successful());
//! assert_eq!(result.results().len(), 2);
//! ```

mod combinator;
mod primitive;
mod search;

pub use combinator::{all_of, any_of, sequence, times, AllOf, AnyOf, Sequence, Times};
pub use primitive::{
    any_string, contains, eof, exact, glob, matches, regexp, starts_with, AnyString, Contains,
    Eof, Exact, FullMatch, Glob, Regexp, StartsWith,
};

use crate::result::{MatchResult, Outcome};
use std::fmt;

/// A pure predicate over `(accumulated text, end-of-stream flag)`.
///
/// Implementations must not keep mutable state between calls: the engine
/// re-evaluates the same matcher against a growing buffer until it succeeds.
pub trait Matcher: Send + Sync + fmt::Display {
    /// The result type this matcher produces.
    type Output: Outcome;

    /// Evaluate the matcher against `input`.
    fn match_input(&self, input: &str, is_eof: bool) -> Self::Output;
}

/// A matcher with its output collapsed to a [`MatchResult`].
///
/// Used for heterogeneous lists of matchers passed to combinators.
pub type BoxMatcher = Box<dyn Matcher<Output = MatchResult>>;

impl<M: Matcher + ?Sized> Matcher for Box<M> {
    type Output = M::Output;

    fn match_input(&self, input: &str, is_eof: bool) -> M::Output {
        (**self).match_input(input, is_eof)
    }
}

impl<M: Matcher + ?Sized> Matcher for &M {
    type Output = M::Output;

    fn match_input(&self, input: &str, is_eof: bool) -> M::Output {
        (**self).match_input(input, is_eof)
    }
}

/// Extension methods for matchers.
pub trait MatcherExt: Matcher + Sized + 'static {
    /// Erase the concrete type, collapsing the output to its representative result.
    fn boxed(self) -> BoxMatcher {
        Box::new(Erased(self))
    }
}

impl<M: Matcher + Sized + 'static> MatcherExt for M {}

struct Erased<M>(M);

impl<M: Matcher> Matcher for Erased<M> {
    type Output = MatchResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MatchResult {
        self.0.match_input(input, is_eof).into_result()
    }
}

impl<M: Matcher> fmt::Display for Erased<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Index of the successful result with the greatest end; ties go to the
/// smallest index.
pub(crate) fn greatest_end(results: &[MatchResult]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, result) in results.iter().enumerate() {
        if let Some(end) = result.matched_end() {
            if best.is_none_or(|(_, best_end)| end > best_end) {
                best = Some((index, end));
            }
        }
    }
    best.map(|(index, _)| index)
}

pub(crate) fn join_display<M: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    matchers: &[M],
) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, m) in matchers.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", m)?;
    }
    f.write_str(")")
}
