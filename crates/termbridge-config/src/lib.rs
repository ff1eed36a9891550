//! termbridge configuration system.
//!
//! TOML-based configuration for the relay server: where to listen, what to
//! run and where, the initial terminal geometry, and logging. Every section
//! uses serde defaults so partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    LogLevel, LoggingConfig, ServerConfig, TargetConfig, TermbridgeConfig, TerminalConfig,
};
pub use toml_loader::{
    create_default_config, default_config_path, load_default, load_from_path, CONFIG_ENV_VAR,
};

use std::path::Path;

use termbridge_common::ConfigError;

/// Read config from `path`, or from the platform default location when
/// `path` is `None`, without validating it.
///
/// For callers that adjust the config before checking it.
pub fn read_config(path: Option<&Path>) -> Result<TermbridgeConfig, ConfigError> {
    match path {
        Some(path) => load_from_path(path),
        None => load_default(),
    }
}

/// [`read_config`], then validate the result.
pub fn load_config(path: Option<&Path>) -> Result<TermbridgeConfig, ConfigError> {
    let config = read_config(path)?;
    validation::validate(&config)?;
    Ok(config)
}
