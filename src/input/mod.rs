//! Per-input engine: reader task, buffer and the deadline-bound match loop

mod reader;

pub use reader::Source;

use crate::buffer::{Decoder, Encoding, InputBuffer};
use crate::event::{ExpectEvent, Hooks};
use crate::filter::Filter;
use crate::matcher::Matcher;
use crate::result::{ExpectError, Outcome};
use reader::{Chunk, ReaderTask};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Sizing of the reader side of an input.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InputConfig {
    pub(crate) read_buffer_size: usize,
    pub(crate) channel_capacity: usize,
    pub(crate) encoding: Encoding,
}

/// Outcome of one engine-level expect, before the facade applies its
/// escalation policy.
#[derive(Debug)]
pub(crate) struct Expectation<R> {
    pub(crate) result: R,
    pub(crate) timed_out: bool,
}

/// Buffering, filtering and matching state of one input stream.
///
/// The reader task only pushes raw chunks into the channel. Decoding,
/// filtering, appending and matching all happen on the task calling
/// [`expect`](InputEngine::expect), so the buffer needs no lock.
pub(crate) struct InputEngine {
    index: usize,
    rx: mpsc::Receiver<Chunk>,
    reader: ReaderTask,
    buffer: InputBuffer,
    decoder: Decoder,
    filter: Option<Box<dyn Filter>>,
    hooks: Hooks,
    reader_done: bool,
}

impl InputEngine {
    /// Start the reader task for `source`.
    pub(crate) fn start(
        index: usize,
        source: Source,
        config: InputConfig,
        filter: Option<Box<dyn Filter>>,
        hooks: Hooks,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let reader = ReaderTask::spawn(index, source, tx, config.read_buffer_size);

        Self {
            index,
            rx,
            reader,
            buffer: InputBuffer::new(),
            decoder: Decoder::new(config.encoding),
            filter,
            hooks,
            reader_done: false,
        }
    }

    /// Wait until `matcher` succeeds, the deadline elapses, or the stream
    /// has ended.
    ///
    /// On success the matched prefix is removed from the buffer. On failure
    /// the buffer is left untouched; if the stream has ended the failure is
    /// an [`ExpectError::Eof`] rather than an unsuccessful result.
    pub(crate) async fn expect<M>(
        &mut self,
        timeout: Duration,
        matcher: &M,
    ) -> Result<Expectation<M::Output>, ExpectError>
    where
        M: Matcher + ?Sized,
    {
        let started = Instant::now();
        let deadline = started + timeout;
        tracing::debug!(input = self.index, %matcher, ?timeout, "expect");

        let mut outcome = matcher.match_input(self.buffer.as_str(), self.reader_done);
        let mut timed_out = false;

        loop {
            let current = outcome.result();
            if current.is_successful() || current.can_stop_matching() || self.reader_done {
                break;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                timed_out = true;
                break;
            }

            match tokio::time::timeout(remaining, self.rx.recv()).await {
                // Deadline elapsed; the next pass notices.
                Err(_) => continue,
                Ok(chunk) => {
                    self.accept(chunk);
                    self.drain_ready();
                }
            }

            outcome = matcher.match_input(self.buffer.as_str(), self.reader_done);
        }

        let current = outcome.result();
        if let Some(end) = current.matched_end() {
            self.buffer.consume(end);
            tracing::debug!(input = self.index, %matcher, consumed = end, "matched");
            self.hooks.emit(|| ExpectEvent::Matched {
                input: self.index,
                matcher: matcher.to_string(),
                consumed: end,
            });
            return Ok(Expectation {
                result: outcome,
                timed_out: false,
            });
        }

        let elapsed = started.elapsed();
        tracing::debug!(
            input = self.index,
            %matcher,
            timed_out,
            eof = self.reader_done,
            ?elapsed,
            "no match"
        );
        self.hooks.emit(|| ExpectEvent::Unmatched {
            input: self.index,
            matcher: matcher.to_string(),
            timed_out,
            elapsed,
        });

        // The buffer can no longer grow, so waiting longer cannot help.
        if self.reader_done {
            return Err(ExpectError::Eof);
        }

        Ok(Expectation {
            result: outcome,
            timed_out,
        })
    }

    #[cfg(test)]
    fn buffered(&self) -> &str {
        self.buffer.as_str()
    }

    /// Stop the reader and drop anything still queued.
    pub(crate) async fn stop(&mut self) {
        self.reader.shutdown().await;
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }

    /// Pull in every chunk that is already queued, without waiting.
    fn drain_ready(&mut self) {
        while !self.reader_done {
            match self.rx.try_recv() {
                Ok(chunk) => self.accept(Some(chunk)),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => self.accept(None),
            }
        }
    }

    fn accept(&mut self, chunk: Option<Chunk>) {
        match chunk {
            Some(Chunk::Data(bytes)) => {
                let text = self.decoder.decode(&bytes);
                self.append(&text);
            }
            Some(Chunk::Failed(error)) => {
                tracing::warn!(input = self.index, %error, "input read failed");
                self.hooks.emit(|| ExpectEvent::ReaderFailed {
                    input: self.index,
                    error: error.to_string(),
                });
                self.finish();
            }
            // A closed channel without a marker means the reader is gone.
            Some(Chunk::Eof) | None => self.finish(),
        }
    }

    fn finish(&mut self) {
        let rest = self.decoder.finish();
        self.append(&rest);
        self.reader_done = true;
        tracing::debug!(input = self.index, "end of stream");
        self.hooks.emit(|| ExpectEvent::EndOfStream { input: self.index });
    }

    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        tracing::trace!(input = self.index, text, "received");
        if let Some(echo) = &self.hooks.echo {
            echo.on_receive(self.index, text);
        }
        self.hooks.emit(|| ExpectEvent::Received {
            input: self.index,
            text: text.to_string(),
        });

        let Some(filter) = self.filter.as_mut() else {
            self.buffer.append(text);
            return;
        };
        if let Some(filtered) = filter.before_append(text, self.buffer.as_str()) {
            self.buffer.append(&filtered);
            filter.after_append(self.buffer.text_mut());
        }
    }
}
