//! Command construction with a sanitized environment.

use portable_pty::CommandBuilder;
use termbridge_common::{ExecError, ExecRequest};

/// Environment variables inherited from the relay process.
///
/// Everything else is dropped so relay-side secrets (API keys, tokens)
/// never reach the console user's shell.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "PATH",
    "LANG",
    "LC_ALL",
    "LC_CTYPE",
    "TZ",
    "TMPDIR",
    "TMP",
    "TEMP",
    // Windows-specific
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "SYSTEMROOT",
    "COMSPEC",
    "HOMEDRIVE",
    "HOMEPATH",
];

/// Build the `CommandBuilder` for a request.
///
/// Inherits only [`ALLOWED_ENV_VARS`], then layers the target's own env
/// on top and applies its working directory.
pub fn build_command(request: &ExecRequest) -> Result<CommandBuilder, ExecError> {
    let program = request
        .program()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ExecError::Start("empty command".into()))?;

    let mut cmd = CommandBuilder::new(program);
    cmd.args(request.args());

    cmd.env_clear();
    for key in ALLOWED_ENV_VARS {
        if let Ok(val) = std::env::var(key) {
            cmd.env(key, val);
        }
    }
    for (key, value) in &request.target.env {
        cmd.env(key, value);
    }

    if let Some(dir) = &request.target.working_dir {
        if !dir.is_dir() {
            return Err(ExecError::Start(format!(
                "working directory {} does not exist",
                dir.display()
            )));
        }
        cmd.cwd(dir);
    }

    Ok(cmd)
}
