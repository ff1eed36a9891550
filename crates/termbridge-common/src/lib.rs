//! Shared types for the termbridge workspace: error taxonomy, identifiers,
//! terminal geometry, and the capability traits a streaming executor pumps.

pub mod errors;
pub mod id;
pub mod stream;
pub mod types;

pub use errors::{ConfigError, ExecError, RelayError, TermbridgeError};
pub use id::SessionId;
pub use stream::{
    ConsoleInput, ConsoleOutput, StreamOptions, StreamingExecutor, TerminalSizeQueue,
};
pub use types::{ExecRequest, ExecTarget, ExitStatus, TerminalSize};

pub type Result<T> = std::result::Result<T, TermbridgeError>;
