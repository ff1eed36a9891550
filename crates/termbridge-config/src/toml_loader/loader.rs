//! Reading a config file from disk.

use crate::schema::TermbridgeConfig;
use std::io::ErrorKind;
use std::path::Path;
use termbridge_common::ConfigError;
use tracing::{debug, info};

use super::paths::{create_default_config, default_config_path};

/// Parse the TOML file at `path`. Missing fields take their defaults;
/// validation is left to [`crate::load_config`].
pub fn load_from_path(path: &Path) -> Result<TermbridgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("cannot read {}: {e}", path.display())),
    })?;

    let config: TermbridgeConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load from [`default_config_path`]. On first run the commented default
/// file is written there and the defaults are returned.
pub fn load_default() -> Result<TermbridgeConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            debug!(path = %path.display(), "no config file yet");
            create_default_config(&path)?;
            Ok(TermbridgeConfig::default())
        }
        other => other,
    }
}
