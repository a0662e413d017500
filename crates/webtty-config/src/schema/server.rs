//! Listener configuration.

use serde::{Deserialize, Serialize};

/// Where the WebSocket endpoint listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (IP or hostname).
    pub bind: String,
    /// TCP port (valid range: 1-65535).
    pub port: u16,
}

impl ServerConfig {
    /// `bind:port` as a socket address string.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3001,
        }
    }
}
