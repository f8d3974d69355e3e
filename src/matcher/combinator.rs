//! Matcher combinators

use super::{greatest_end, join_display, Matcher};
use crate::result::{ExpectError, MatchResult, MultiResult, Outcome};
use std::fmt;

fn collect_non_empty<M, I>(name: &str, matchers: I) -> Result<Vec<M>, ExpectError>
where
    I: IntoIterator<Item = M>,
{
    let matchers: Vec<M> = matchers.into_iter().collect();
    if matchers.is_empty() {
        return Err(ExpectError::invalid(format!(
            "{} requires at least one matcher",
            name
        )));
    }
    Ok(matchers)
}

/// Failure that may stop the engine only if every sub-result agrees.
fn combined_failure(input: &str, results: &[MatchResult]) -> MatchResult {
    MatchResult::failure(input, results.iter().all(MatchResult::can_stop_matching))
}

/// Conjunction of matchers, see [`all_of`].
pub struct AllOf<M> {
    matchers: Vec<M>,
}

/// Succeeds when every matcher succeeds against the same input.
///
/// On success the representative is the sub-result with the greatest end,
/// ties going to the smallest declaration index. On failure it is the first
/// failing sub-result.
///
/// # Errors
///
/// Returns an invalid-argument error when `matchers` is empty.
pub fn all_of<M, I>(matchers: I) -> Result<AllOf<M>, ExpectError>
where
    M: Matcher,
    I: IntoIterator<Item = M>,
{
    Ok(AllOf {
        matchers: collect_non_empty("all_of", matchers)?,
    })
}

impl<M: Matcher> Matcher for AllOf<M> {
    type Output = MultiResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MultiResult {
        let results: Vec<MatchResult> = self
            .matchers
            .iter()
            .map(|m| m.match_input(input, is_eof).into_result())
            .collect();

        let representative = match results.iter().find(|r| !r.is_successful()) {
            Some(first_failure) => MatchResult::failure(
                first_failure.input(),
                results.iter().all(MatchResult::can_stop_matching),
            ),
            None => match greatest_end(&results) {
                Some(index) => results[index].clone(),
                None => combined_failure(input, &results),
            },
        };
        MultiResult::new(representative, results)
    }
}

impl<M: Matcher> fmt::Display for AllOf<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_display(f, "all_of", &self.matchers)
    }
}

/// Disjunction of matchers, see [`any_of`].
pub struct AnyOf<M> {
    matchers: Vec<M>,
}

/// Succeeds when at least one matcher succeeds against the input.
///
/// The representative is the successful sub-result with the greatest end,
/// ties going to the smallest declaration index. If nothing succeeds the
/// representative stands for sub-result 0.
///
/// # Errors
///
/// Returns an invalid-argument error when `matchers` is empty.
pub fn any_of<M, I>(matchers: I) -> Result<AnyOf<M>, ExpectError>
where
    M: Matcher,
    I: IntoIterator<Item = M>,
{
    Ok(AnyOf {
        matchers: collect_non_empty("any_of", matchers)?,
    })
}

impl<M: Matcher> Matcher for AnyOf<M> {
    type Output = MultiResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MultiResult {
        let results: Vec<MatchResult> = self
            .matchers
            .iter()
            .map(|m| m.match_input(input, is_eof).into_result())
            .collect();

        let representative = match greatest_end(&results) {
            Some(index) => results[index].clone(),
            None => combined_failure(results[0].input(), &results),
        };
        MultiResult::new(representative, results)
    }
}

impl<M: Matcher> fmt::Display for AnyOf<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_display(f, "any_of", &self.matchers)
    }
}

/// Apply each step where the previous one stopped.
///
/// Sub-results are rebased onto the whole input. The representative spans
/// from the last step's start to its end, with `before` holding everything
/// preceding the last step.
fn chained<'m, M, I>(steps: I, input: &str, is_eof: bool) -> MultiResult
where
    M: Matcher + 'm,
    I: IntoIterator<Item = &'m M>,
{
    let mut position = 0;
    let mut results = Vec::new();

    for step in steps {
        let result = step
            .match_input(&input[position..], is_eof)
            .into_result()
            .rebased(input, position);
        match result.matched_end() {
            Some(end) => {
                position = end;
                results.push(result);
            }
            None => {
                let can_stop = result.can_stop_matching();
                results.push(result);
                return MultiResult::new(MatchResult::failure(input, can_stop), results);
            }
        }
    }

    let representative = match results.last() {
        Some(last) => last.clone(),
        None => MatchResult::failure(input, is_eof),
    };
    MultiResult::new(representative, results)
}

/// Repetition of one matcher, see [`times`].
pub struct Times<M> {
    count: usize,
    matcher: M,
}

/// Succeeds once `matcher` has matched `count` times in a row.
///
/// Each repetition starts where the previous one ended, so
/// `times(2, contains("x"))` needs two separate occurrences of `x`.
///
/// # Errors
///
/// Returns an invalid-argument error when `count` is zero.
pub fn times<M: Matcher>(count: usize, matcher: M) -> Result<Times<M>, ExpectError> {
    if count == 0 {
        return Err(ExpectError::invalid("times requires a positive count"));
    }
    Ok(Times { count, matcher })
}

impl<M: Matcher> Matcher for Times<M> {
    type Output = MultiResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MultiResult {
        chained(std::iter::repeat_n(&self.matcher, self.count), input, is_eof)
    }
}

impl<M: Matcher> fmt::Display for Times<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "times({}, {})", self.count, self.matcher)
    }
}

/// Ordered sequence of matchers, see [`sequence`].
pub struct Sequence<M> {
    matchers: Vec<M>,
}

/// Succeeds when the matchers match one after another, in order.
///
/// # Errors
///
/// Returns an invalid-argument error when `matchers` is empty.
pub fn sequence<M, I>(matchers: I) -> Result<Sequence<M>, ExpectError>
where
    M: Matcher,
    I: IntoIterator<Item = M>,
{
    Ok(Sequence {
        matchers: collect_non_empty("sequence", matchers)?,
    })
}

impl<M: Matcher> Matcher for Sequence<M> {
    type Output = MultiResult;

    fn match_input(&self, input: &str, is_eof: bool) -> MultiResult {
        chained(&self.matchers, input, is_eof)
    }
}

impl<M: Matcher> fmt::Display for Sequence<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_display(f, "sequence", &self.matchers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{contains, eof, regexp, MatcherExt};

    #[test]
    fn test_all_of_success_picks_greatest_end() {
        let m = all_of(vec![
            contains("a").boxed(),
            contains("b").boxed(),
            regexp("a(.*)").unwrap().boxed(),
        ])
        .unwrap();

        let result = m.match_input("a1b2c3_a1b2", false);
        assert!(result.is_successful());
        assert_eq!(result.results().len(), 3);
        assert_eq!(result.end().unwrap(), 11);
        assert_eq!(result.group_at(1).unwrap(), Some("1b2c3_a1b2"));
    }

    #[test]
    fn test_all_of_tie_goes_to_smallest_index() {
        let m = all_of(vec![
            regexp("b(2)").unwrap().boxed(),
            contains("b2").boxed(),
            contains("a").boxed(),
        ])
        .unwrap();

        let result = m.match_input("a1b2", false);
        assert_eq!(result.end().unwrap(), 4);
        assert_eq!(result.group_count().unwrap(), 1);
    }

    #[test]
    fn test_all_of_failure_is_first_failing() {
        let m = all_of(vec![contains("a"), contains("x"), contains("y")]).unwrap();
        let result = m.match_input("abc", false);
        assert!(!result.is_successful());
        assert!(result.results()[0].is_successful());
        assert!(!result.results()[1].is_successful());
        assert!(matches!(result.before(), Err(ExpectError::NoResult)));
    }

    #[test]
    fn test_all_of_empty() {
        let empty: Vec<crate::matcher::Contains> = Vec::new();
        assert!(matches!(
            all_of(empty),
            Err(ExpectError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_any_of_picks_greatest_end() {
        let m = any_of(vec![contains("a"), contains("c"), contains("b")]).unwrap();
        let result = m.match_input("abc", false);
        assert_eq!(result.group().unwrap(), "c");
    }

    #[test]
    fn test_any_of_none_succeed() {
        let m = any_of(vec![contains("x"), contains("y")]).unwrap();
        let result = m.match_input("abc", false);
        assert!(!result.is_successful());
        assert_eq!(result.input(), result.results()[0].input());
        assert!(!result.can_stop_matching());
    }

    #[test]
    fn test_any_of_can_stop_only_when_all_agree() {
        let m = any_of(vec![contains("x").boxed(), eof().boxed()]).unwrap();
        assert!(!m.match_input("abc", false).can_stop_matching());
        assert!(m.match_input("abc", true).is_successful());

        let n = any_of(vec![contains("x"), contains("y")]).unwrap();
        assert!(n.match_input("abc", true).can_stop_matching());
    }

    #[test]
    fn test_any_of_empty() {
        let empty: Vec<crate::matcher::Contains> = Vec::new();
        assert!(any_of(empty).is_err());
    }

    #[test]
    fn test_times() {
        let m = times(2, contains("b")).unwrap();
        let result = m.match_input("ab cb d", false);
        assert!(result.is_successful());
        assert_eq!(result.results().len(), 2);
        assert_eq!(result.results()[0].end().unwrap(), 2);
        assert_eq!(result.start().unwrap(), 4);
        assert_eq!(result.end().unwrap(), 5);
        assert_eq!(result.before().unwrap(), "ab c");

        assert!(!m.match_input("ab c", false).is_successful());
    }

    #[test]
    fn test_times_is_stateless() {
        let m = times(3, contains("x")).unwrap();
        assert!(!m.match_input("xx", false).is_successful());
        assert!(!m.match_input("xx", false).is_successful());
        assert!(m.match_input("xxx", false).is_successful());
    }

    #[test]
    fn test_times_zero() {
        assert!(times(0, contains("x")).is_err());
    }

    #[test]
    fn test_sequence() {
        let m = sequence(vec![contains("login:").boxed(), regexp(r"\$ ").unwrap().boxed()])
            .unwrap();
        let result = m.match_input("$ x login: ok $ ", false);
        assert!(result.is_successful());
        assert_eq!(result.start().unwrap(), 14);
        assert_eq!(result.results()[0].before().unwrap(), "$ x ");

        let out_of_order = m.match_input("$ login:", false);
        assert!(!out_of_order.is_successful());
        assert_eq!(out_of_order.results().len(), 2);
    }
}
