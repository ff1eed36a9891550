//! Capability traits consumed by a streaming executor.
//!
//! An executor opens a live stdio/resize stream to a process and pumps it
//! against these three roles. One concrete type may implement all of them;
//! [`StreamOptions::combined`] wires such a type into every role at once.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{ExecError, RelayError};
use crate::types::{ExecRequest, ExitStatus, TerminalSize};

/// Source of console input for the process.
#[async_trait]
pub trait ConsoleInput: Send + Sync {
    /// Wait for the next chunk of input and append it to `buf`.
    ///
    /// `Ok(0)` means nothing for the process this time around; call again.
    /// On error, `buf` may still hold bytes that must be delivered before
    /// the input side is closed.
    async fn read_input(&self, buf: &mut Vec<u8>) -> Result<usize, RelayError>;
}

/// Sink for process output.
#[async_trait]
pub trait ConsoleOutput: Send + Sync {
    async fn write_output(&self, data: &[u8]) -> Result<usize, RelayError>;
}

/// Produces terminal geometry changes for the process.
#[async_trait]
pub trait TerminalSizeQueue: Send + Sync {
    /// Wait for the next size change. `None` means no more will come.
    async fn next_terminal_size(&self) -> Option<TerminalSize>;
}

/// The stream roles handed to an executor.
#[derive(Clone, Default)]
pub struct StreamOptions {
    pub stdin: Option<Arc<dyn ConsoleInput>>,
    pub stdout: Option<Arc<dyn ConsoleOutput>>,
    pub stderr: Option<Arc<dyn ConsoleOutput>>,
    pub resize: Option<Arc<dyn TerminalSizeQueue>>,
    pub tty: bool,
}

impl StreamOptions {
    /// Use one value as stdin, stdout, stderr and resize source.
    pub fn combined<T>(handler: Arc<T>, tty: bool) -> Self
    where
        T: ConsoleInput + ConsoleOutput + TerminalSizeQueue + 'static,
    {
        Self {
            stdin: Some(handler.clone()),
            stdout: Some(handler.clone()),
            stderr: Some(handler.clone()),
            resize: Some(handler),
            tty,
        }
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .field("resize", &self.resize.is_some())
            .field("tty", &self.tty)
            .finish()
    }
}

/// Runs a command and pumps its stdio/resize stream until it ends.
#[async_trait]
pub trait StreamingExecutor: Send + Sync {
    async fn stream(
        &self,
        request: &ExecRequest,
        options: StreamOptions,
    ) -> Result<ExitStatus, ExecError>;
}
