//! Error types for multiexpect

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during expect operations.
///
/// An unsuccessful match is *not* an error by default: `expect` returns a
/// [`MatchResult`](crate::MatchResult) whose `is_successful()` is `false`.
/// The [`Timeout`](ExpectError::Timeout) and
/// [`Unsuccessful`](ExpectError::Unsuccessful) variants only appear when the
/// facade was built with `error_on_timeout` or `exception_on_failure`.
///
/// # Examples
///
/// ```no_run
/// use multiexpect::{matcher::contains, Expect, ExpectError};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut expect = Expect::builder()
///     .timeout(Duration::from_secs(5))
///     .error_on_timeout(true)
///     .spawn("some-command")?;
///
/// match expect.expect(contains("done")).await {
///     Ok(result) => println!("Before: {}", result.before()?),
///     Err(ExpectError::Timeout { duration, input }) => {
///         eprintln!("Timed out after {:?} with {:?} pending", duration, input);
///     }
///     Err(ExpectError::Eof) => eprintln!("Process closed its output"),
///     Err(e) => return Err(e.into()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ExpectError {
    /// Timeout waiting for a match.
    ///
    /// Only raised when the facade was built with `error_on_timeout(true)`.
    #[error("Timeout waiting for match (after {duration:?})")]
    Timeout {
        /// Duration that was waited before timeout
        duration: Duration,
        /// Text that was examined when the deadline elapsed
        input: String,
    },

    /// The match was unsuccessful.
    ///
    /// Only raised when the facade was built with `exception_on_failure(true)`.
    #[error("Match was unsuccessful")]
    Unsuccessful {
        /// Text that was examined when the match gave up
        input: String,
    },

    /// The input stream ended before the match succeeded.
    ///
    /// Unmatched text stays buffered; [`eof`](crate::matcher::eof) can still
    /// take it.
    #[error("Input closed before the match succeeded")]
    Eof,

    /// I/O error while writing to the output or releasing a resource.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A caller passed an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A match attribute was read from an unsuccessful result.
    #[error("No result: the match was not successful")]
    NoResult,

    /// Invalid pattern.
    #[error("Invalid pattern: {0}")]
    PatternError(#[from] PatternError),

    /// The facade has already been closed.
    #[error("Expect session is closed")]
    Closed,

    /// No tokio runtime is available to host the reader tasks.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// PTY creation or manipulation failed.
    #[error("PTY error: {0}")]
    PtyError(String),

    /// The command could not be spawned.
    #[error("Failed to spawn process: {0}")]
    SpawnError(String),

    /// There is no child process to query.
    ///
    /// Returned by process queries on facades that were not built with
    /// `spawn`, or after `wait()` consumed the child.
    #[error("No running child process")]
    ProcessExited,
}

impl ExpectError {
    /// Returns `true` for [`ExpectError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExpectError::Timeout { .. })
    }

    /// Returns `true` for [`ExpectError::Eof`].
    pub fn is_eof(&self) -> bool {
        matches!(self, ExpectError::Eof)
    }

    /// Returns `true` for errors in the I/O category, end of stream included.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            ExpectError::Eof | ExpectError::IoError(_) | ExpectError::PtyError(_)
        )
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ExpectError::InvalidArgument(message.into())
    }
}

/// Errors related to pattern creation.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Invalid regex pattern.
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Invalid glob pattern.
    #[error("Invalid glob: {0}")]
    InvalidGlob(String),
}
