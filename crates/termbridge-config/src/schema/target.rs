//! Execution target: what to run for each console session, and where.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use termbridge_common::ExecTarget;

/// Command and environment for the process behind every console session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Identity of the execution target, used in logs and diagnostics.
    pub name: String,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    /// Initial working directory. `None` means inherit from the relay.
    pub working_directory: Option<String>,
    /// `TERM` exported to the process.
    pub term: String,
    /// Extra environment variables injected into the process.
    pub env: BTreeMap<String, String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            name: "local".into(),
            command: vec!["sh".into()],
            working_directory: None,
            term: "xterm-256color".into(),
            env: BTreeMap::new(),
        }
    }
}

impl TargetConfig {
    pub fn exec_target(&self) -> ExecTarget {
        let mut env = self.env.clone();
        env.entry("TERM".into()).or_insert_with(|| self.term.clone());
        ExecTarget {
            name: self.name.clone(),
            working_dir: self.working_directory.as_ref().map(Into::into),
            env,
        }
    }
}
