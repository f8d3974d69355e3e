//! Observability hooks
//!
//! Besides `tracing` log events, an [`Expect`](crate::Expect) can be given
//! an observer callback receiving structured [`ExpectEvent`]s, and an
//! [`Echo`] that mirrors the conversation (for example to the terminal).

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Structured event emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectEvent {
    /// Bytes were written to the output.
    Sent {
        /// Number of bytes written
        bytes: usize,
    },
    /// Text was decoded from an input, before filtering.
    Received {
        /// Input index
        input: usize,
        /// Decoded text
        text: String,
    },
    /// A matcher succeeded.
    Matched {
        /// Input index
        input: usize,
        /// Matcher description
        matcher: String,
        /// Number of buffer bytes consumed by the match
        consumed: usize,
    },
    /// A matcher gave up without success.
    Unmatched {
        /// Input index
        input: usize,
        /// Matcher description
        matcher: String,
        /// Whether the deadline elapsed
        timed_out: bool,
        /// Time spent waiting
        elapsed: Duration,
    },
    /// An input reached end of stream.
    EndOfStream {
        /// Input index
        input: usize,
    },
    /// Reading an input failed; treated as end of stream.
    ReaderFailed {
        /// Input index
        input: usize,
        /// Error message
        error: String,
    },
    /// The session was closed.
    Closed,
}

/// Callback receiving [`ExpectEvent`]s.
pub type Observer = Arc<dyn Fn(&ExpectEvent) + Send + Sync>;

/// Mirrors the conversation with the far end.
pub trait Echo: Send + Sync {
    /// Called with text written by [`send`](crate::Expect::send) and friends.
    fn on_send(&self, text: &str);

    /// Called with decoded text read from input `input`.
    fn on_receive(&self, input: usize, text: &str);
}

/// [`Echo`] writing both directions to a [`Write`] implementation.
///
/// ```no_run
/// use multiexpect::{EchoWriter, Expect};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let expect = Expect::builder()
///     .echo(EchoWriter::new(std::io::stderr()))
///     .spawn("bash")?;
/// # Ok(())
/// # }
/// ```
pub struct EchoWriter<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> EchoWriter<W> {
    /// Echo to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn write(&self, text: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            // Echo is best effort; a broken terminal must not fail the session.
            let _ = writer.write_all(text.as_bytes());
            let _ = writer.flush();
        }
    }
}

impl<W: Write + Send> Echo for EchoWriter<W> {
    fn on_send(&self, text: &str) {
        self.write(text);
    }

    fn on_receive(&self, _input: usize, text: &str) {
        self.write(text);
    }
}

/// Optional hooks shared by the facade and its inputs.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) echo: Option<Arc<dyn Echo>>,
    pub(crate) observer: Option<Observer>,
}

impl Hooks {
    pub(crate) fn emit(&self, event: impl FnOnce() -> ExpectEvent) {
        if let Some(observer) = &self.observer {
            observer(&event());
        }
    }
}
