//! Tracing subscriber setup for the `termbridge` binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither the command line nor `RUST_LOG` set one.
pub fn default_filter(level: &str) -> String {
    format!("termbridge={level},termbridge_relay={level},termbridge_pty={level}")
}

/// Pick the filter directives: CLI override, then `RUST_LOG`, then
/// `fallback`.
pub fn resolve_filter(cli: Option<&str>, env: Option<String>, fallback: &str) -> String {
    match (cli, env) {
        (Some(cli), _) => cli.to_string(),
        (None, Some(env)) if !env.trim().is_empty() => env,
        _ => fallback.to_string(),
    }
}

/// Install the global subscriber. Human-readable lines unless `json`.
pub fn init_tracing(directives: &str, json: bool) {
    let env_filter = EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("invalid log filter {directives:?} ({e}), falling back to info");
        EnvFilter::new("info")
    });
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
