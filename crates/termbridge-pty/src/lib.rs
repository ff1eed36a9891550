//! Local streaming executor backed by a native pseudo-terminal.
//!
//! [`LocalPtyExecutor`] runs the requested command inside a PTY via
//! `portable-pty` and pumps it against the console roles it is handed:
//! process output to stdout, console input to the PTY, and size changes to
//! the PTY master.

mod env;
mod executor;
mod process;

pub use env::{build_command, ALLOWED_ENV_VARS};
pub use executor::LocalPtyExecutor;
pub use process::{PtyProcess, INPUT_QUEUE_DEPTH, PTY_READ_CHUNK};
