use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Terminal geometry in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerminalSize {
    pub rows: u16,
    pub cols: u16,
}

impl TerminalSize {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

impl fmt::Display for TerminalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Where a command runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecTarget {
    /// Human-readable identity of the execution target (shown in logs).
    pub name: String,
    /// Working directory for the process. `None` inherits the executor's.
    pub working_dir: Option<PathBuf>,
    /// Extra environment for the process.
    pub env: BTreeMap<String, String>,
}

/// Everything an executor needs to start one process stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub target: ExecTarget,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    /// Allocate a terminal for the process.
    pub tty: bool,
    /// Geometry used until the client reports its own.
    pub initial_size: TerminalSize,
}

impl ExecRequest {
    pub fn new(target: ExecTarget, command: Vec<String>) -> Self {
        Self {
            target,
            command,
            tty: true,
            initial_size: TerminalSize::default(),
        }
    }

    /// The program to run, if the command is non-empty.
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }
}

/// How a process stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    pub code: u32,
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_size_display_is_cols_by_rows() {
        assert_eq!(TerminalSize::new(40, 120).to_string(), "120x40");
    }

    #[test]
    fn terminal_size_default_is_80x24() {
        let size = TerminalSize::default();
        assert_eq!(size.rows, 24);
        assert_eq!(size.cols, 80);
    }

    #[test]
    fn exec_request_program_and_args() {
        let req = ExecRequest::new(
            ExecTarget::default(),
            vec!["sh".into(), "-c".into(), "echo hi".into()],
        );
        assert_eq!(req.program(), Some("sh"));
        assert_eq!(req.args(), &["-c".to_string(), "echo hi".to_string()]);
        assert!(req.tty);
    }

    #[test]
    fn exec_request_empty_command() {
        let req = ExecRequest::new(ExecTarget::default(), Vec::new());
        assert_eq!(req.program(), None);
        assert!(req.args().is_empty());
    }

    #[test]
    fn exit_status_success() {
        assert!(ExitStatus { code: 0 }.success());
        assert!(!ExitStatus { code: 130 }.success());
    }
}
