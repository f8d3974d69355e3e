//! Builder for configuring an [`Expect`] facade

use super::sink::Sink;
use super::spawn::PtyProcess;
use super::Expect;
use crate::buffer::Encoding;
use crate::event::{Echo, ExpectEvent, Hooks, Observer};
use crate::filter::Filter;
use crate::input::{InputConfig, InputEngine, Source};
use crate::result::ExpectError;
use portable_pty::PtySize;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Default timeout for expect operations (in seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default size of a single read from an input (in bytes)
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Default number of chunks queued between a reader and its input
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Default PTY rows
const DEFAULT_PTY_ROWS: u16 = 24;

/// Default PTY columns
const DEFAULT_PTY_COLS: u16 = 80;

/// Builder for configuring and starting an [`Expect`] facade.
///
/// # Defaults
///
/// - Timeout: 30 seconds
/// - Encoding: UTF-8
/// - Line separator: `"\n"`
/// - Read buffer: 4096 bytes, 64 queued chunks per input
/// - Escalation: unsuccessful matches are returned, not raised
/// - PTY size: 24 rows × 80 columns (only used by [`spawn`](Self::spawn))
///
/// # Examples
///
/// ```no_run
/// use multiexpect::{filter::strip_ansi, Expect};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (stream, _peer) = tokio::io::duplex(1024);
/// let (reader, writer) = tokio::io::split(stream);
///
/// let expect = Expect::builder()
///     .output(writer)
///     .input(reader)
///     .timeout(Duration::from_secs(10))
///     .input_filter(strip_ansi())
///     .exception_on_failure(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ExpectBuilder {
    output: Option<Sink>,
    inputs: Vec<Source>,
    timeout: Duration,
    encoding: Encoding,
    echo: Option<Arc<dyn Echo>>,
    observer: Option<Observer>,
    filter: Option<Box<dyn Filter>>,
    line_separator: String,
    error_on_timeout: bool,
    exception_on_failure: bool,
    read_buffer_size: usize,
    channel_capacity: usize,
    pty_size: PtySize,
}

impl Default for ExpectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpectBuilder {
    /// Create a builder with default configuration.
    ///
    /// See the [`ExpectBuilder`] documentation for default values.
    pub fn new() -> Self {
        Self {
            output: None,
            inputs: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            encoding: Encoding::default(),
            echo: None,
            observer: None,
            filter: None,
            line_separator: "\n".to_string(),
            error_on_timeout: false,
            exception_on_failure: false,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            pty_size: PtySize {
                rows: DEFAULT_PTY_ROWS,
                cols: DEFAULT_PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
        }
    }

    /// Set the output everything is sent to.
    pub fn output(mut self, writer: impl AsyncWrite + Unpin + Send + 'static) -> Self {
        self.output = Some(Sink::from_async(writer));
        self
    }

    /// Set a blocking output, written from the blocking thread pool.
    pub fn blocking_output(mut self, writer: impl Write + Send + 'static) -> Self {
        self.output = Some(Sink::from_blocking(writer));
        self
    }

    /// Add an input. Inputs are indexed in the order they are added.
    pub fn input(mut self, reader: impl AsyncRead + Unpin + Send + 'static) -> Self {
        self.inputs.push(Source::from_async(reader));
        self
    }

    /// Add a blocking input, read on the blocking thread pool.
    pub fn blocking_input(mut self, reader: impl Read + Send + 'static) -> Self {
        self.inputs.push(Source::from_blocking(reader));
        self
    }

    /// Set the default timeout for expect operations. Must be non-zero.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set an already wrapped output.
    pub fn sink(mut self, sink: Sink) -> Self {
        self.output = Some(sink);
        self
    }

    /// Add an already wrapped input.
    pub fn source(mut self, source: Source) -> Self {
        self.inputs.push(source);
        self
    }

    /// Set the character encoding used to decode inputs and encode sends.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Mirror sent and received text to `echo`.
    pub fn echo(mut self, echo: impl Echo + 'static) -> Self {
        self.echo = Some(Arc::new(echo));
        self
    }

    /// Receive structured [`ExpectEvent`]s.
    pub fn observer(mut self, observer: impl Fn(&ExpectEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Filter applied to every input before text reaches the buffer.
    ///
    /// Each input gets its own [`fork`](Filter::fork) of the filter, so
    /// held-back partial data is never shared between inputs while enable
    /// switches are.
    pub fn input_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Set the line separator appended by `send_line`.
    pub fn line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    /// Turn an unsuccessful match caused by a timeout into
    /// [`ExpectError::Timeout`].
    pub fn error_on_timeout(mut self, enabled: bool) -> Self {
        self.error_on_timeout = enabled;
        self
    }

    /// Turn any unsuccessful match into [`ExpectError::Unsuccessful`].
    pub fn exception_on_failure(mut self, enabled: bool) -> Self {
        self.exception_on_failure = enabled;
        self
    }

    /// Set the size of a single read from an input.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set how many chunks may queue between a reader and its input.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set PTY (terminal) size used by [`spawn`](Self::spawn).
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.pty_size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self
    }

    /// Validate the configuration and start one reader per input.
    ///
    /// # Errors
    ///
    /// - [`ExpectError::InvalidArgument`] when no output or no input was
    ///   given, or the timeout or a size is zero
    /// - [`ExpectError::Runtime`] when called outside a tokio runtime
    pub fn build(self) -> Result<Expect, ExpectError> {
        self.validate()?;
        let output = self
            .output
            .ok_or_else(|| ExpectError::invalid("an output is required"))?;
        if self.inputs.is_empty() {
            return Err(ExpectError::invalid("at least one input is required"));
        }

        let hooks = Hooks {
            echo: self.echo,
            observer: self.observer,
        };
        let config = InputConfig {
            read_buffer_size: self.read_buffer_size,
            channel_capacity: self.channel_capacity,
            encoding: self.encoding,
        };
        let filter = self.filter;
        let inputs: Vec<InputEngine> = self
            .inputs
            .into_iter()
            .enumerate()
            .map(|(index, source)| {
                let filter = filter.as_ref().map(|f| f.fork());
                InputEngine::start(index, source, config, filter, hooks.clone())
            })
            .collect();

        tracing::debug!(
            inputs = inputs.len(),
            timeout = ?self.timeout,
            encoding = ?self.encoding,
            "expect started"
        );

        Ok(Expect {
            output: Some(output),
            inputs,
            timeout: self.timeout,
            encoding: self.encoding,
            line_separator: self.line_separator,
            error_on_timeout: self.error_on_timeout,
            exception_on_failure: self.exception_on_failure,
            hooks,
            process: None,
        })
    }

    /// Spawn `command` on a PTY and build a facade around it.
    ///
    /// The PTY master becomes the output and input 0; inputs added with
    /// [`input`](Self::input) follow it. An output set on the builder is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The command string is empty
    /// - The PTY cannot be created
    /// - The process cannot be spawned
    /// - The configuration is invalid, see [`build`](Self::build)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use multiexpect::Expect;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let expect = Expect::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .spawn("python3 -i")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(mut self, command: &str) -> Result<Expect, ExpectError> {
        // Fail before a child exists that nobody would reap.
        self.validate()?;

        let (process, streams) = PtyProcess::spawn(command, self.pty_size)?;
        self.output = Some(Sink::from_blocking(streams.writer));
        self.inputs.insert(0, Source::from_blocking(streams.reader));

        let mut expect = self.build()?;
        expect.process = Some(process);
        Ok(expect)
    }

    fn validate(&self) -> Result<(), ExpectError> {
        if self.timeout.is_zero() {
            return Err(ExpectError::invalid("timeout must be positive"));
        }
        if self.read_buffer_size == 0 {
            return Err(ExpectError::invalid("read buffer size must be positive"));
        }
        if self.channel_capacity == 0 {
            return Err(ExpectError::invalid("channel capacity must be positive"));
        }
        tokio::runtime::Handle::try_current()
            .map_err(|e| ExpectError::Runtime(e.to_string()))?;
        Ok(())
    }
}
