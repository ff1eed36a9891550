//! Full configuration validation.
//!
//! Each check pushes a message; all problems are reported together in a
//! single `ConfigError::ValidationError`.

mod helpers;


use crate::schema::TermbridgeConfig;
use std::net::SocketAddr;
use termbridge_common::ConfigError;

use helpers::check_range;

const MESSAGE_BYTES: (usize, usize) = (1024, 16 * 1024 * 1024);
const TERMINAL_CELLS: (u16, u16) = (1, 1000);

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &TermbridgeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_target(&mut errors, config);
    validate_terminal(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_server(errors: &mut Vec<String>, config: &TermbridgeConfig) {
    if config.server.listen.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "server.listen = {:?} is not a socket address",
            config.server.listen
        ));
    }
    if !config.server.path.starts_with('/') {
        errors.push(format!(
            "server.path = {:?} must start with '/'",
            config.server.path
        ));
    }
    check_range(
        errors,
        "server.max_message_bytes",
        config.server.max_message_bytes,
        MESSAGE_BYTES,
    );
}

fn validate_target(errors: &mut Vec<String>, config: &TermbridgeConfig) {
    match config.target.command.first() {
        None => errors.push("target.command is empty".into()),
        Some(program) if program.trim().is_empty() => {
            errors.push("target.command has an empty program name".into());
        }
        Some(_) => {}
    }
    if config.target.env.keys().any(|k| k.is_empty() || k.contains('=')) {
        errors.push("target.env has an invalid variable name".into());
    }
}

fn validate_terminal(errors: &mut Vec<String>, config: &TermbridgeConfig) {
    check_range(errors, "terminal.rows", config.terminal.rows, TERMINAL_CELLS);
    check_range(errors, "terminal.cols", config.terminal.cols, TERMINAL_CELLS);
}
