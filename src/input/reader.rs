//! Background reader tasks feeding the hand-off channel

use bytes::Bytes;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A raw byte source for one input.
///
/// Async sources run on a regular tokio task and are cancelled mid-read.
/// Blocking sources (such as a PTY master) run on the blocking pool; they
/// stop at the next read that returns once the input has been closed.
pub enum Source {
    /// A tokio reader.
    Async(Box<dyn AsyncRead + Unpin + Send>),
    /// A blocking `std::io::Read`.
    Blocking(Box<dyn Read + Send>),
}

impl Source {
    /// Wrap a tokio reader.
    pub fn from_async(reader: impl AsyncRead + Unpin + Send + 'static) -> Self {
        Source::Async(Box::new(reader))
    }

    /// Wrap a blocking reader.
    pub fn from_blocking(reader: impl Read + Send + 'static) -> Self {
        Source::Blocking(Box::new(reader))
    }
}

/// Message sent from a reader task to its input engine.
#[derive(Debug)]
pub(crate) enum Chunk {
    Data(Bytes),
    Eof,
    Failed(io::Error),
}

/// Handle to a running reader task.
pub(crate) struct ReaderTask {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    blocking: bool,
}

impl ReaderTask {
    /// Start pumping `source` into `tx`.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        index: usize,
        source: Source,
        tx: mpsc::Sender<Chunk>,
        read_size: usize,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let (handle, blocking) = match source {
            Source::Async(reader) => (
                tokio::spawn(pump_async(index, reader, tx, read_size)),
                false,
            ),
            Source::Blocking(reader) => {
                let stop = Arc::clone(&stop);
                let handle = tokio::task::spawn_blocking(move || {
                    pump_blocking(index, reader, tx, read_size, &stop)
                });
                (handle, true)
            }
        };

        Self {
            handle: Some(handle),
            stop,
            blocking,
        }
    }

    /// Ask the task to stop without waiting for it.
    pub(crate) fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Cancel and wait until an async reader has released its source.
    ///
    /// Aborting has no effect on a blocking reader, which only observes the
    /// stop flag; it is not waited for since it may be stuck in `read`.
    pub(crate) async fn shutdown(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if !self.blocking {
                // Cancellation is the expected outcome here.
                let _ = handle.await;
            }
        }
    }
}

impl Drop for ReaderTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn pump_async(
    index: usize,
    mut reader: Box<dyn AsyncRead + Unpin + Send>,
    tx: mpsc::Sender<Chunk>,
    read_size: usize,
) {
    let mut buf = vec![0u8; read_size];
    loop {
        let chunk = match reader.read(&mut buf).await {
            Ok(0) => Chunk::Eof,
            Ok(n) => Chunk::Data(Bytes::copy_from_slice(&buf[..n])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Chunk::Failed(e),
        };
        let last = !matches!(chunk, Chunk::Data(_));
        tracing::trace!(input = index, ?chunk, "reader chunk");
        if tx.send(chunk).await.is_err() || last {
            break;
        }
    }
}

fn pump_blocking(
    index: usize,
    mut reader: Box<dyn Read + Send>,
    tx: mpsc::Sender<Chunk>,
    read_size: usize,
    stop: &AtomicBool,
) {
    let mut buf = vec![0u8; read_size];
    while !stop.load(Ordering::Acquire) {
        let chunk = match reader.read(&mut buf) {
            Ok(0) => Chunk::Eof,
            Ok(n) => Chunk::Data(Bytes::copy_from_slice(&buf[..n])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Chunk::Failed(e),
        };
        let last = !matches!(chunk, Chunk::Data(_));
        tracing::trace!(input = index, ?chunk, "reader chunk");
        if tx.blocking_send(chunk).is_err() || last {
            break;
        }
    }
}
