//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# webtty configuration
# Only override what you want to change -- missing fields use defaults.

[server]
# bind = "0.0.0.0"
# port = 3001            # 1-65535

[shell]
# program = ""           # empty: $SHELL, then bash
# args = []
# working_directory = "" # empty: the server's current directory
# inherit_env = true     # false: pass only HOME, PATH, USER, LANG, ...
# term = "xterm-color"

# [shell.env]
# EDITOR = "nvim"

[terminal]
# cols = 80              # 1-1000
# rows = 30              # 1-1000
# output_queue = 256     # 1-65536 chunks

[logging]
# level = "info"         # trace, debug, info, warn, error
"##
    .to_string()
}
