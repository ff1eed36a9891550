use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures observed by a relay session or its orchestration.
///
/// Payloads are rendered strings so a terminal error can be recorded once
/// and handed back to every later caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Inbound bytes were not a valid envelope for their `op`.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Valid envelope carrying an `op` the relay does not accept.
    #[error("unknown message type '{0}'")]
    UnknownOperation(String),

    /// The duplex connection failed or was closed by the peer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The session was shut down locally before any read failure.
    #[error("session closed")]
    SessionClosed,

    /// The streaming executor could not establish the process stream.
    #[error("failed to start remote command: {0}")]
    ExecutorStart(String),

    /// The process stream failed after it had been established.
    #[error("remote command failed: {0}")]
    Executor(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("start failed: {0}")]
    Start(String),

    #[error("stream failed: {0}")]
    Stream(String),
}

impl From<ExecError> for RelayError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Start(msg) => RelayError::ExecutorStart(msg),
            ExecError::Stream(msg) => RelayError::Executor(msg),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TermbridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
