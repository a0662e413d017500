//! Shell process configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shell process settings.
///
/// Controls which shell each session launches, its arguments, working
/// directory, and the environment it sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell program path. Empty string means auto-detect from `$SHELL`.
    pub program: String,
    /// Extra arguments passed to the shell.
    pub args: Vec<String>,
    /// Initial working directory. Empty means the server's current directory.
    pub working_directory: String,
    /// Extra environment variables injected into the shell.
    pub env: HashMap<String, String>,
    /// Inherit the server's full environment. When false only a small
    /// allow-list of variables is passed through.
    pub inherit_env: bool,
    /// Value exported as `TERM`.
    pub term: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            working_directory: String::new(),
            env: HashMap::new(),
            inherit_env: true,
            term: "xterm-color".into(),
        }
    }
}

impl ShellConfig {
    /// Configured program, or `None` when it should be auto-detected.
    pub fn program(&self) -> Option<&str> {
        Some(self.program.trim()).filter(|p| !p.is_empty())
    }

    /// Configured working directory, or `None` to inherit.
    pub fn working_directory(&self) -> Option<&str> {
        Some(self.working_directory.trim()).filter(|d| !d.is_empty())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_config_defaults() {
        let config = ShellConfig::default();
        assert!(config.program().is_none());
        assert!(config.args.is_empty());
        assert!(config.working_directory().is_none());
        assert!(config.env.is_empty());
        assert!(config.inherit_env);
        assert_eq!(config.term, "xterm-color");
    }

    #[test]
    fn shell_config_partial_toml() {
        let toml_str = r#"
program = "/bin/zsh"
args = ["-l"]
inherit_env = false
"#;
        let config: ShellConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.program(), Some("/bin/zsh"));
        assert_eq!(config.args, vec!["-l"]);
        assert!(!config.inherit_env);
        assert_eq!(config.term, "xterm-color");
    }

    #[test]
    fn blank_program_means_auto_detect() {
        let config: ShellConfig = toml::from_str("program = \"   \"").unwrap();
        assert!(config.program().is_none());
    }

    #[test]
    fn shell_config_with_env_vars() {
        let toml_str = r#"
[env]
EDITOR = "nvim"
LANG = "en_US.UTF-8"
"#;
        let config: ShellConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.env.get("EDITOR").unwrap(), "nvim");
        assert_eq!(config.env.get("LANG").unwrap(), "en_US.UTF-8");
    }
}
