//! Default TOML config template with inline documentation comments.

/// The default config file content.
pub fn default_config_toml() -> &'static str {
    r##"# termbridge configuration
# Only override what you want to change -- missing fields use defaults.

[server]
# listen = "0.0.0.0:8080"
# path = "/terminal"            # WebSocket upgrade path
# max_message_bytes = 1048576   # 1024-16777216

[target]
# name = "local"                # shown in logs and client diagnostics
# command = ["sh"]              # program followed by its arguments
# working_directory = "/home/user"
# term = "xterm-256color"

[target.env]
# EDITOR = "vi"

[terminal]
# rows = 24                     # 1-1000, until the client sends a resize
# cols = 80                     # 1-1000

[logging]
# level = "info"                # trace, debug, info, warn, error
# json = false
"##
}
