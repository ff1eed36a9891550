use serde::{Deserialize, Serialize};

/// Front door settings: where WebSocket upgrades are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    pub listen: String,
    /// Request path that is upgraded to a console session.
    pub path: String,
    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".into(),
            path: "/terminal".into(),
            max_message_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.path, "/terminal");
        assert_eq!(config.max_message_bytes, 1_048_576);
    }

    #[test]
    fn server_config_partial_toml() {
        let config: ServerConfig = toml::from_str("path = \"/ws\"").unwrap();
        assert_eq!(config.path, "/ws");
        assert_eq!(config.listen, "0.0.0.0:8080");
    }
}
