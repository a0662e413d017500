//! webtty configuration system.
//!
//! TOML-based configuration for the listener, the spawned shell, initial
//! terminal geometry, and logging. All sections use `serde(default)` so
//! partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use webtty_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("listening on {}", config.server.listen_addr());
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    LogLevel, LoggingConfig, ServerConfig, ShellConfig, TerminalConfig, WebTtyConfig,
};

use std::path::Path;

use webtty_common::ConfigError;

/// Load config from `path` if given, otherwise from the platform default path.
///
/// A missing default file is created from the commented template. An explicit
/// path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<WebTtyConfig, ConfigError> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            toml_loader::load_from_path(path)
        }
        None => toml_loader::load_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_explicit_missing_path_is_not_found() {
        let err = load_config(Some(Path::new("/tmp/webtty_definitely_missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn load_config_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webtty.toml");
        std::fs::write(&path, "[server]\nport = 4100\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.server.port, 4100);
    }
}
