//! Where the config file lives, and writing a fresh one.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use termbridge_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

/// Environment variable that points at a config file, ahead of the
/// platform default.
pub const CONFIG_ENV_VAR: &str = "TERMBRIDGE_CONFIG";

/// `$TERMBRIDGE_CONFIG` if set, else `<config_dir>/termbridge/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or_else(|| {
        ConfigError::ParseError("no platform config directory; pass --config".into())
    })?;
    Ok(base.join("termbridge").join("config.toml"))
}

/// Write the commented default config to `path`, creating parent
/// directories. An existing file is never overwritten.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let io_err = |what: &str, e: std::io::Error| {
        ConfigError::ParseError(format!("{what} {}: {e}", path.display()))
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err("cannot create directory for", e))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => {
                ConfigError::ValidationError(format!("{} already exists", path.display()))
            }
            _ => io_err("cannot create", e),
        })?;
    file.write_all(default_config_toml().as_bytes())
        .map_err(|e| io_err("cannot write", e))?;

    info!(path = %path.display(), "wrote default config");
    Ok(())
}
