use super::*;
use std::path::Path;
use termbridge_common::ConfigError;

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn missing_file_is_file_not_found() {
    let result = load_from_path(Path::new("/definitely/not/here/termbridge.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn partial_file_keeps_other_defaults() {
    let (_dir, path) = write_config(
        r#"
[target]
name = "db-1"
command = ["psql"]

[terminal]
cols = 132
"#,
    );

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.target.name, "db-1");
    assert_eq!(config.target.command, vec!["psql".to_string()]);
    assert_eq!(config.terminal.cols, 132);
    assert_eq!(config.terminal.rows, 24);
    assert_eq!(config.server.path, "/terminal");
}

#[test]
fn broken_toml_is_a_parse_error() {
    let (_dir, path) = write_config("[server\nlisten = ");
    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn mistyped_field_is_a_parse_error() {
    let (_dir, path) = write_config("[terminal]\nrows = \"tall\"\n");
    assert!(matches!(
        load_from_path(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn default_file_is_written_and_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    create_default_config(&path).unwrap();
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.listen, "0.0.0.0:8080");
    assert_eq!(config.target.command, vec!["sh".to_string()]);
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn default_file_never_overwrites() {
    let (_dir, path) = write_config("[target]\nname = \"mine\"\n");

    let err = create_default_config(&path).unwrap_err();
    assert!(err.to_string().contains("already exists"));
    assert_eq!(load_from_path(&path).unwrap().target.name, "mine");
}

#[test]
fn template_is_the_default_config() {
    let parsed: crate::TermbridgeConfig = toml::from_str(default_config_toml()).unwrap();
    let defaults = crate::TermbridgeConfig::default();
    assert_eq!(parsed.server.listen, defaults.server.listen);
    assert_eq!(parsed.target.command, defaults.target.command);
    assert_eq!(parsed.terminal.rows, defaults.terminal.rows);
}

#[test]
fn platform_path_is_under_termbridge() {
    if std::env::var_os(CONFIG_ENV_VAR).is_some() {
        return;
    }
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("termbridge/config.toml"));
    }
}
