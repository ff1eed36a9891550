use serde::{Deserialize, Serialize};

/// Terminal geometry used until the browser reports its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}
