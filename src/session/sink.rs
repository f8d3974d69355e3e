//! Output side of a session

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// A raw byte sink receiving everything sent through the facade.
pub enum Sink {
    /// A tokio writer.
    Async(Box<dyn AsyncWrite + Unpin + Send>),
    /// A blocking `std::io::Write`, driven from the blocking pool.
    Blocking(Arc<Mutex<Box<dyn Write + Send>>>),
}

impl Sink {
    /// Wrap a tokio writer.
    pub fn from_async(writer: impl AsyncWrite + Unpin + Send + 'static) -> Self {
        Sink::Async(Box::new(writer))
    }

    /// Wrap a blocking writer.
    pub fn from_blocking(writer: impl Write + Send + 'static) -> Self {
        Sink::Blocking(Arc::new(Mutex::new(Box::new(writer))))
    }

    /// Write all of `data` and flush.
    pub(crate) async fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        match self {
            Sink::Async(writer) => {
                writer.write_all(data).await?;
                writer.flush().await
            }
            Sink::Blocking(writer) => {
                let writer = Arc::clone(writer);
                let data = data.to_vec();

                tokio::task::spawn_blocking(move || {
                    let mut writer = writer.blocking_lock();
                    writer.write_all(&data)?;
                    writer.flush()
                })
                .await
                .map_err(std::io::Error::other)?
            }
        }
    }

    /// Release the underlying writer.
    pub(crate) async fn shutdown(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Async(writer) => writer.shutdown().await,
            Sink::Blocking(writer) => writer.lock().await.flush(),
        }
    }
}
