//! Configuration schema types for termbridge.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod logging;
mod server;
mod target;
mod terminal;

pub use logging::*;
pub use server::*;
pub use target::*;
pub use terminal::*;

use serde::{Deserialize, Serialize};
use termbridge_common::{ExecRequest, TerminalSize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermbridgeConfig {
    pub server: ServerConfig,
    pub target: TargetConfig,
    pub terminal: TerminalConfig,
    pub logging: LoggingConfig,
}

impl TermbridgeConfig {
    /// Build the request every console session runs.
    pub fn exec_request(&self) -> ExecRequest {
        let mut request = ExecRequest::new(self.target.exec_target(), self.target.command.clone());
        request.initial_size = TerminalSize::new(self.terminal.rows, self.terminal.cols);
        request
    }
}
