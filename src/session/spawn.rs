//! Process spawning on a pseudo-terminal

use crate::result::ExpectError;
use portable_pty::{
    native_pty_system, Child, ChildKiller, CommandBuilder, ExitStatus, MasterPty, PtySize,
};
use std::io::{Read, Write};

/// A child process attached to a PTY master.
pub(crate) struct PtyProcess {
    _master: Box<dyn MasterPty + Send>,
    child: Option<Box<dyn Child + Send + Sync>>,
}

/// Both ends of the PTY master, handed to the facade as input 0 and output.
pub(crate) struct PtyStreams {
    pub(crate) reader: Box<dyn Read + Send>,
    pub(crate) writer: Box<dyn Write + Send>,
}

impl PtyProcess {
    /// Spawn `command` (split on whitespace) on a new PTY.
    pub(crate) fn spawn(command: &str, size: PtySize) -> Result<(Self, PtyStreams), ExpectError> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some((program, args)) = parts.split_first() else {
            return Err(ExpectError::SpawnError("Empty command".to_string()));
        };

        let pair = native_pty_system()
            .openpty(size)
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ExpectError::SpawnError(e.to_string()))?;
        // Only the child keeps the slave open, so its exit reaches the reader as EOF.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        tracing::debug!(command, pid = ?child.process_id(), "spawned");

        Ok((
            Self {
                _master: pair.master,
                child: Some(child),
            },
            PtyStreams { reader, writer },
        ))
    }

    pub(crate) fn is_alive(&mut self) -> Result<bool, ExpectError> {
        let child = self.child.as_mut().ok_or(ExpectError::ProcessExited)?;
        match child.try_wait() {
            Ok(Some(_)) => Ok(false),
            Ok(None) => Ok(true),
            Err(e) => Err(ExpectError::IoError(e)),
        }
    }

    /// Wait for the child to exit. The child handle is consumed.
    pub(crate) async fn wait(&mut self) -> Result<ExitStatus, ExpectError> {
        let mut child = self.child.take().ok_or(ExpectError::ProcessExited)?;

        let status = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| ExpectError::IoError(std::io::Error::other(e)))??;

        Ok(status)
    }

    /// Kill the child if it is still running.
    pub(crate) fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                if let Err(error) = child.kill() {
                    tracing::warn!(%error, "failed to kill child process");
                }
                // Reap it so no zombie is left behind.
                let _ = child.wait();
            }
        }
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        self.kill();
    }
}
