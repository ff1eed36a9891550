use std::path::PathBuf;

use clap::Parser;
use termbridge_config::TermbridgeConfig;

/// termbridge: serve an interactive terminal to browsers over WebSocket.
#[derive(Parser, Debug)]
#[command(name = "termbridge", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address override, e.g. 127.0.0.1:9000.
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Log filter override (trace, debug, info, warn, error, or directives).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write the default config file (never overwriting one) and exit.
    #[arg(long)]
    pub write_default_config: bool,

    /// Command to run instead of the configured one.
    #[arg(last = true)]
    pub command: Vec<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

impl Args {
    /// Replace config values with the ones given on the command line.
    pub fn apply_overrides(&self, config: &mut TermbridgeConfig) {
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        if !self.command.is_empty() {
            config.target.command = self.command.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides_and_trailing_command() {
        let args = Args::try_parse_from([
            "termbridge",
            "--listen",
            "127.0.0.1:9000",
            "--log-level",
            "debug",
            "--",
            "bash",
            "-l",
        ])
        .unwrap();
        assert_eq!(args.listen.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.command, vec!["bash".to_string(), "-l".to_string()]);
        assert!(!args.write_default_config);
    }

    #[test]
    fn overrides_repair_an_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nlisten = \"\"\n[target]\ncommand = []\n").unwrap();
        assert!(termbridge_config::load_config(Some(&path)).is_err());

        let args = Args::try_parse_from([
            "termbridge",
            "--listen",
            "127.0.0.1:9000",
            "--",
            "bash",
        ])
        .unwrap();
        let mut config = termbridge_config::read_config(Some(&path)).unwrap();
        args.apply_overrides(&mut config);

        termbridge_config::validation::validate(&config).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:9000");
        assert_eq!(config.target.command, vec!["bash".to_string()]);
    }

    #[test]
    fn no_overrides_keep_the_file_values() {
        let args = Args::try_parse_from(["termbridge"]).unwrap();
        let mut config = TermbridgeConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.server.listen, TermbridgeConfig::default().server.listen);
        assert_eq!(config.target.command, vec!["sh".to_string()]);
    }

    #[test]
    fn defaults_are_empty() {
        let args = Args::try_parse_from(["termbridge"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.listen.is_none());
        assert!(args.command.is_empty());
    }
}
