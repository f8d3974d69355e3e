//! Interact loop: react to intermediate output until a terminal match
//!
//! ```no_run
//! use multiexpect::{matcher::contains, Expect, InteractAction};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut expect = Expect::spawn("ftp example.com")?;
//! let mut prompts = 0;
//! let result = expect
//!     .interact()
//!     .when(contains("Name:"))
//!     .then(|_| InteractAction::send_line("anonymous"))
//!     .when(contains("Password:"))
//!     .then(|_| {
//!         prompts += 1;
//!         InteractAction::send_line("guest")
//!     })
//!     .until(contains("ftp>"))
//!     .await?;
//! assert!(result.is_successful());
//! # Ok(())
//! # }
//! ```

use crate::matcher::{greatest_end, join_display, BoxMatcher, Matcher, MatcherExt};
use crate::result::{ExpectError, MatchResult, Outcome};
use crate::session::Expect;
use std::fmt;
use tokio::time::Instant;

/// What the interact loop does after a trigger fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractAction {
    /// Keep looping.
    Continue,
    /// Send raw bytes, then keep looping.
    Send(Vec<u8>),
    /// Send a line (text plus the line separator), then keep looping.
    SendLine(String),
}

impl InteractAction {
    /// Send raw bytes.
    pub fn send(bytes: impl AsRef<[u8]>) -> Self {
        InteractAction::Send(bytes.as_ref().to_vec())
    }

    /// Send a line.
    pub fn send_line(text: impl Into<String>) -> Self {
        InteractAction::SendLine(text.into())
    }
}

type Action<'a> = Box<dyn FnMut(&MatchResult) -> InteractAction + Send + 'a>;

/// Registers `(trigger, action)` pairs for an interact loop.
///
/// Created by [`Expect::interact`] or [`Expect::interact_with`]; finished
/// with [`until`](Self::until).
pub struct InteractBuilder<'a> {
    expect: &'a mut Expect,
    index: usize,
    triggers: Vec<BoxMatcher>,
    actions: Vec<Action<'a>>,
}

/// A trigger waiting for its action.
pub struct When<'a> {
    builder: InteractBuilder<'a>,
    trigger: BoxMatcher,
}

impl<'a> InteractBuilder<'a> {
    pub(crate) fn new(expect: &'a mut Expect, index: usize) -> Self {
        Self {
            expect,
            index,
            triggers: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Register a trigger. Its action is given with [`When::then`].
    pub fn when<M: Matcher + 'static>(self, trigger: M) -> When<'a> {
        When {
            builder: self,
            trigger: trigger.boxed(),
        }
    }

    /// Run the loop until `terminal` succeeds.
    ///
    /// Every iteration waits for the terminal matcher or any trigger. A
    /// trigger fires when it succeeds with a non-empty prefix and ends
    /// before the terminal match (or the terminal has not matched); fired
    /// actions run in registration order and the buffer is consumed up to
    /// the furthest fired trigger. The loop returns the terminal result once
    /// an iteration fires no trigger. The whole call is bounded by the
    /// facade's default timeout; when it runs out, the terminal result of
    /// the last iteration is returned.
    ///
    /// # Errors
    ///
    /// Propagates end of stream and I/O failures, as well as errors from
    /// sends requested by actions. Escalation flags are not applied.
    pub async fn until<M: Matcher>(self, terminal: M) -> Result<M::Output, ExpectError> {
        let InteractBuilder {
            expect,
            index,
            triggers,
            mut actions,
        } = self;
        let matcher = InteractMatcher {
            terminal: &terminal,
            triggers: &triggers,
        };

        let budget = expect.timeout();
        let deadline = Instant::now() + budget;
        tracing::debug!(input = index, %matcher, ?budget, "interact");

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let done = expect.expect_raw(index, remaining, &matcher).await?;
            let outcome = done.result;

            let fired = outcome.fired();
            for &i in &fired {
                tracing::trace!(input = index, trigger = %triggers[i], "trigger fired");
                match (actions[i])(&outcome.triggers[i]) {
                    InteractAction::Continue => {}
                    InteractAction::Send(bytes) => expect.send_bytes(&bytes).await?,
                    InteractAction::SendLine(text) => expect.send_line(&text).await?,
                }
            }

            if fired.is_empty() || Instant::now() >= deadline {
                return Ok(outcome.terminal);
            }
        }
    }
}

impl<'a> When<'a> {
    /// Set the action run every time the trigger fires.
    pub fn then(
        self,
        action: impl FnMut(&MatchResult) -> InteractAction + Send + 'a,
    ) -> InteractBuilder<'a> {
        let mut builder = self.builder;
        builder.triggers.push(self.trigger);
        builder.actions.push(Box::new(action));
        builder
    }
}

/// The terminal matcher raced against every trigger.
struct InteractMatcher<'m, M: ?Sized> {
    terminal: &'m M,
    triggers: &'m [BoxMatcher],
}

#[derive(Debug, Clone)]
struct InteractOutcome<R> {
    terminal: R,
    triggers: Vec<MatchResult>,
    representative: MatchResult,
}

impl<R: Outcome> InteractOutcome<R> {
    /// Indexes of the triggers that fired, in registration order.
    ///
    /// A match ending at offset 0 consumes nothing and never fires.
    fn fired(&self) -> Vec<usize> {
        let limit = self.terminal.result().matched_end();
        self.triggers
            .iter()
            .enumerate()
            .filter_map(|(i, result)| {
                let end = result.matched_end().filter(|&end| end > 0)?;
                limit.is_none_or(|limit| end < limit).then_some(i)
            })
            .collect()
    }
}

impl<R: Outcome> Outcome for InteractOutcome<R> {
    fn result(&self) -> &MatchResult {
        &self.representative
    }

    fn into_result(self) -> MatchResult {
        self.representative
    }
}

impl<M: Matcher + ?Sized> Matcher for InteractMatcher<'_, M> {
    type Output = InteractOutcome<M::Output>;

    fn match_input(&self, input: &str, is_eof: bool) -> Self::Output {
        let terminal = self.terminal.match_input(input, is_eof);
        let triggers: Vec<MatchResult> = self
            .triggers
            .iter()
            .map(|t| t.match_input(input, is_eof))
            .collect();

        let mut outcome = InteractOutcome {
            terminal,
            triggers,
            representative: MatchResult::failure(input, false),
        };

        let fired = outcome.fired();
        let furthest = if fired.is_empty() {
            None
        } else {
            let candidates: Vec<MatchResult> = fired
                .iter()
                .map(|&i| outcome.triggers[i].clone())
                .collect();
            greatest_end(&candidates).map(|best| candidates[best].clone())
        };

        outcome.representative = match furthest {
            Some(trigger) => trigger,
            None => {
                let terminal = outcome.terminal.result();
                if terminal.is_successful() {
                    terminal.clone()
                } else {
                    let can_stop = terminal.can_stop_matching()
                        && outcome.triggers.iter().all(MatchResult::can_stop_matching);
                    MatchResult::failure(input, can_stop)
                }
            }
        };
        outcome
    }
}

impl<M: Matcher + ?Sized> fmt::Display for InteractMatcher<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "until {} ", self.terminal)?;
        join_display(f, "when", self.triggers)
    }
}
