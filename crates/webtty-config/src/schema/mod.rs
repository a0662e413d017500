//! Configuration schema types for webtty.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod logging;
mod server;
mod shell;
mod terminal;

pub use logging::*;
pub use server::*;
pub use shell::*;
pub use terminal::*;

use serde::{Deserialize, Serialize};

/// Root configuration for webtty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebTtyConfig {
    pub server: ServerConfig,
    pub shell: ShellConfig,
    pub terminal: TerminalConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_sections() {
        let config = WebTtyConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.terminal.cols, 80);
        assert_eq!(config.terminal.rows, 30);
        assert_eq!(config.shell.term, "xterm-color");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: WebTtyConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0");
        assert!(config.shell.program.is_empty());
        assert!(config.shell.inherit_env);
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let config: WebTtyConfig = toml::from_str(
            r#"
[vscode]
port = 8080

[terminal]
rows = 40
"#,
        )
        .unwrap();
        assert_eq!(config.terminal.rows, 40);
        assert_eq!(config.terminal.cols, 80);
    }
}
