//! termbridge: WebSocket terminal relay.
//!
//! Accepts browser terminals on the configured path and runs the configured
//! command in a local PTY for each of them.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use termbridge_common::{ConfigError, TermbridgeError};
use termbridge_config::TermbridgeConfig;
use termbridge_pty::LocalPtyExecutor;
use termbridge_relay::{logging, RelayServer};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if args.write_default_config {
        return match write_default_config(&args) {
            Ok(path) => {
                println!("wrote default config to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("termbridge: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("termbridge: {e}");
            return ExitCode::FAILURE;
        }
    };

    let directives = logging::resolve_filter(
        args.log_level.as_deref(),
        std::env::var("RUST_LOG").ok(),
        &logging::default_filter(config.logging.level.as_str()),
    );
    logging::init_tracing(&directives, config.logging.json);

    tracing::info!("termbridge v{} starting...", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "termbridge failed");
            ExitCode::FAILURE
        }
    }
}

/// Read the config file, apply command-line overrides, then validate the
/// result once, so an override can replace an invalid file value.
fn load_config(args: &cli::Args) -> Result<TermbridgeConfig, ConfigError> {
    let mut config = termbridge_config::read_config(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    termbridge_config::validation::validate(&config)?;
    Ok(config)
}

fn write_default_config(args: &cli::Args) -> Result<std::path::PathBuf, ConfigError> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => termbridge_config::default_config_path()?,
    };
    termbridge_config::create_default_config(&path)?;
    Ok(path)
}

async fn run(config: TermbridgeConfig) -> Result<(), TermbridgeError> {
    tracing::info!(
        target_name = %config.target.name,
        command = ?config.target.command,
        "serving terminals"
    );

    let executor = Arc::new(LocalPtyExecutor::new());
    let server = RelayServer::bind(&config, executor).await?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                signal.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    server.serve(shutdown).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
