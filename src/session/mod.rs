//! The engine facade: one output, one or more inputs

mod builder;
mod sink;
mod spawn;

pub use builder::{
    ExpectBuilder, DEFAULT_CHANNEL_CAPACITY, DEFAULT_READ_BUFFER_SIZE, DEFAULT_TIMEOUT_SECS,
};
pub use sink::Sink;

use crate::buffer::Encoding;
use crate::event::{ExpectEvent, Hooks};
use crate::input::{Expectation, InputEngine};
use crate::interact::InteractBuilder;
use crate::matcher::{all_of, Matcher};
use crate::result::{ExpectError, MultiResult, Outcome};
use portable_pty::ExitStatus;
use spawn::PtyProcess;
use std::time::Duration;

/// Drives a conversation with a process, a socket or any other pair of
/// byte streams.
///
/// An `Expect` owns one output and one or more inputs. Every input has a
/// background reader feeding its own buffer; [`expect`](Self::expect) waits
/// on input 0 and [`expect_in`](Self::expect_in) on any other. An
/// unsuccessful match is returned as a result unless the builder enabled
/// `error_on_timeout` or `exception_on_failure`.
///
/// # Examples
///
/// ```no_run
/// use multiexpect::{matcher::{contains, regexp}, Expect};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut expect = Expect::spawn("python3 -i")?;
///
/// expect.expect(contains(">>> ")).await?;
/// expect.send_line("print(6 * 7)").await?;
/// let result = expect.expect(regexp(r"(\d+)")?).await?;
/// assert_eq!(result.group_at(1)?, Some("42"));
///
/// expect.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Expect {
    output: Option<Sink>,
    inputs: Vec<InputEngine>,
    timeout: Duration,
    encoding: Encoding,
    line_separator: String,
    error_on_timeout: bool,
    exception_on_failure: bool,
    hooks: Hooks,
    process: Option<PtyProcess>,
}

impl Expect {
    /// Create a new builder.
    pub fn builder() -> ExpectBuilder {
        ExpectBuilder::new()
    }

    /// Spawn a command on a PTY with default configuration.
    ///
    /// This is a shorthand for `Expect::builder().spawn(command)`.
    ///
    /// ```no_run
    /// use multiexpect::Expect;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let expect = Expect::spawn("echo Hello")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(command: &str) -> Result<Self, ExpectError> {
        ExpectBuilder::new().spawn(command)
    }

    /// Send text, encoded with the configured encoding, and flush.
    pub async fn send(&mut self, text: &str) -> Result<(), ExpectError> {
        let bytes = self.encoding.encode(text);
        self.write(&bytes).await?;
        if let Some(echo) = &self.hooks.echo {
            echo.on_send(text);
        }
        Ok(())
    }

    /// Send text followed by the line separator.
    ///
    /// `send_line("")` sends the bare separator.
    pub async fn send_line(&mut self, text: &str) -> Result<(), ExpectError> {
        let line = format!("{}{}", text, self.line_separator);
        self.send(&line).await
    }

    /// Send raw bytes, bypassing the encoding.
    ///
    /// Control characters can be sent directly:
    ///
    /// ```no_run
    /// # async fn example(expect: &mut multiexpect::Expect) -> Result<(), multiexpect::ExpectError> {
    /// // Ctrl-C
    /// expect.send_bytes(&[0x03]).await?;
    /// // Up arrow
    /// expect.send_bytes(b"\x1b[A").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), ExpectError> {
        self.write(bytes).await?;
        if let Some(echo) = &self.hooks.echo {
            echo.on_send(&String::from_utf8_lossy(bytes));
        }
        Ok(())
    }

    /// Wait on input 0 using the default timeout.
    pub async fn expect<M: Matcher>(&mut self, matcher: M) -> Result<M::Output, ExpectError> {
        self.expect_in_timeout(0, self.timeout, matcher).await
    }

    /// Wait on input 0 with an explicit, non-zero timeout.
    pub async fn expect_timeout<M: Matcher>(
        &mut self,
        timeout: Duration,
        matcher: M,
    ) -> Result<M::Output, ExpectError> {
        self.expect_in_timeout(0, timeout, matcher).await
    }

    /// Wait on input `index` using the default timeout.
    pub async fn expect_in<M: Matcher>(
        &mut self,
        index: usize,
        matcher: M,
    ) -> Result<M::Output, ExpectError> {
        self.expect_in_timeout(index, self.timeout, matcher).await
    }

    /// Wait on input `index` with an explicit, non-zero timeout.
    ///
    /// # Errors
    ///
    /// - [`ExpectError::InvalidArgument`] for an unknown input or a zero timeout
    /// - [`ExpectError::Eof`] when the input ended before the match succeeded
    /// - [`ExpectError::Timeout`] / [`ExpectError::Unsuccessful`] when the
    ///   corresponding escalation flag is set
    /// - [`ExpectError::Closed`] after [`close`](Self::close)
    pub async fn expect_in_timeout<M: Matcher>(
        &mut self,
        index: usize,
        timeout: Duration,
        matcher: M,
    ) -> Result<M::Output, ExpectError> {
        if timeout.is_zero() {
            return Err(ExpectError::invalid("timeout must be positive"));
        }
        let done = self.expect_raw(index, timeout, &matcher).await?;
        self.escalate(done, timeout)
    }

    /// Wait until every matcher succeeds on input 0.
    ///
    /// Shorthand for `expect(all_of(matchers)?)`.
    pub async fn expect_all<M, I>(&mut self, matchers: I) -> Result<MultiResult, ExpectError>
    where
        M: Matcher,
        I: IntoIterator<Item = M>,
    {
        self.expect_all_in(0, matchers).await
    }

    /// Wait until every matcher succeeds on input `index`.
    pub async fn expect_all_in<M, I>(
        &mut self,
        index: usize,
        matchers: I,
    ) -> Result<MultiResult, ExpectError>
    where
        M: Matcher,
        I: IntoIterator<Item = M>,
    {
        let matcher = all_of(matchers)?;
        self.expect_in(index, matcher).await
    }

    /// Start an interact loop on input 0.
    pub fn interact(&mut self) -> InteractBuilder<'_> {
        InteractBuilder::new(self, 0)
    }

    /// Start an interact loop on input `index`.
    pub fn interact_with(&mut self, index: usize) -> Result<InteractBuilder<'_>, ExpectError> {
        self.check_index(index)?;
        Ok(InteractBuilder::new(self, index))
    }

    /// The default timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the default timeout. Must be non-zero.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), ExpectError> {
        if timeout.is_zero() {
            return Err(ExpectError::invalid("timeout must be positive"));
        }
        self.timeout = timeout;
        Ok(())
    }

    /// Number of inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.output.is_none()
    }

    /// Check if the spawned process is still alive.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::ProcessExited`] if this facade was not built
    /// with `spawn`, or the process handle was consumed by
    /// [`wait`](Self::wait) or [`close`](Self::close).
    pub fn is_alive(&mut self) -> Result<bool, ExpectError> {
        match &mut self.process {
            Some(process) => process.is_alive(),
            None => Err(ExpectError::ProcessExited),
        }
    }

    /// Wait for the spawned process to exit and return its exit status.
    ///
    /// After this call the process handle is consumed and subsequent calls
    /// fail with [`ExpectError::ProcessExited`].
    pub async fn wait(&mut self) -> Result<ExitStatus, ExpectError> {
        match &mut self.process {
            Some(process) => process.wait().await,
            None => Err(ExpectError::ProcessExited),
        }
    }

    /// Stop every reader, kill a spawned process and release the output.
    ///
    /// Calling `close` again is a no-op. Every other operation fails with
    /// [`ExpectError::Closed`] afterwards.
    pub async fn close(&mut self) -> Result<(), ExpectError> {
        let Some(mut output) = self.output.take() else {
            return Ok(());
        };

        if let Some(mut process) = self.process.take() {
            // Reaping the killed child blocks.
            tokio::task::spawn_blocking(move || process.kill())
                .await
                .map_err(|e| ExpectError::IoError(std::io::Error::other(e)))?;
        }
        for input in &mut self.inputs {
            input.stop().await;
        }
        let flushed = output.shutdown().await;
        drop(output);

        tracing::debug!("expect closed");
        self.hooks.emit(|| ExpectEvent::Closed);
        flushed.map_err(ExpectError::from)
    }

    /// Run one engine-level expect without escalation.
    pub(crate) async fn expect_raw<M>(
        &mut self,
        index: usize,
        timeout: Duration,
        matcher: &M,
    ) -> Result<Expectation<M::Output>, ExpectError>
    where
        M: Matcher + ?Sized,
    {
        self.check_index(index)?;
        self.inputs[index].expect(timeout, matcher).await
    }

    fn check_index(&self, index: usize) -> Result<(), ExpectError> {
        if self.is_closed() {
            return Err(ExpectError::Closed);
        }
        if index >= self.inputs.len() {
            return Err(ExpectError::invalid(format!(
                "input index {} out of range ({} inputs)",
                index,
                self.inputs.len()
            )));
        }
        Ok(())
    }

    fn escalate<R: Outcome>(
        &self,
        done: Expectation<R>,
        timeout: Duration,
    ) -> Result<R, ExpectError> {
        let result = done.result.result();
        if result.is_successful() {
            return Ok(done.result);
        }
        if done.timed_out && self.error_on_timeout {
            return Err(ExpectError::Timeout {
                duration: timeout,
                input: result.input().to_string(),
            });
        }
        if self.exception_on_failure {
            return Err(ExpectError::Unsuccessful {
                input: result.input().to_string(),
            });
        }
        Ok(done.result)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), ExpectError> {
        let output = self.output.as_mut().ok_or(ExpectError::Closed)?;
        output.write_all(bytes).await?;
        tracing::trace!(bytes = bytes.len(), "sent");
        self.hooks.emit(|| ExpectEvent::Sent { bytes: bytes.len() });
        Ok(())
    }
}
