//! Initial terminal geometry and output queue sizing.

use serde::{Deserialize, Serialize};

/// Terminal settings applied when a session's pty is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Initial columns (valid range: 1-1000).
    pub cols: u16,
    /// Initial rows (valid range: 1-1000).
    pub rows: u16,
    /// Output chunks buffered between the pty reader and the session
    /// (valid range: 1-65536). A full queue stalls the reader, which in
    /// turn lets the kernel pty buffer apply backpressure to the shell.
    pub output_queue: u32,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 30,
            output_queue: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_config_defaults() {
        let config = TerminalConfig::default();
        assert_eq!(config.cols, 80);
        assert_eq!(config.rows, 30);
        assert_eq!(config.output_queue, 256);
    }

    #[test]
    fn terminal_config_partial_toml() {
        let config: TerminalConfig = toml::from_str("cols = 132").unwrap();
        assert_eq!(config.cols, 132);
        assert_eq!(config.rows, 30);
    }
}
