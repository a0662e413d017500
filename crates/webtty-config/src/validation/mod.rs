//! Full configuration validation.
//!
//! Collects every range violation into a single `ConfigError` so a bad
//! file reports all of its problems at once.

mod helpers;


use crate::schema::WebTtyConfig;
use webtty_common::ConfigError;

use helpers::{validate_non_empty, validate_range};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &WebTtyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_shell(&mut errors, config);
    validate_terminal(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_server(errors: &mut Vec<String>, config: &WebTtyConfig) {
    validate_non_empty(errors, "server.bind", &config.server.bind);
    validate_range(errors, "server.port", u32::from(config.server.port), 1, 65535);
}

fn validate_shell(errors: &mut Vec<String>, config: &WebTtyConfig) {
    validate_non_empty(errors, "shell.term", &config.shell.term);
    if config.shell.env.keys().any(|k| k.is_empty() || k.contains('=')) {
        errors.push("shell.env keys must be non-empty and must not contain '='".into());
    }
}

fn validate_terminal(errors: &mut Vec<String>, config: &WebTtyConfig) {
    validate_range(errors, "terminal.cols", u32::from(config.terminal.cols), 1, 1000);
    validate_range(errors, "terminal.rows", u32::from(config.terminal.rows), 1, 1000);
    validate_range(
        errors,
        "terminal.output_queue",
        config.terminal.output_queue,
        1,
        65536,
    );
}
