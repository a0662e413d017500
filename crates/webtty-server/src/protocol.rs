//! Wire protocol between the browser terminal and the server.
//!
//! Every frame is a JSON text message with a `type` discriminator. Session
//! identity is never carried in a message: it is implied by the socket the
//! frame arrives on.

use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;
use webtty_pty::ExitInfo;

/// Informational text of the `connection` greeting.
pub const CONNECTION_GREETING: &str = "Connected to webtty server";

/// `signal` value reported when the process was not killed by a signal.
pub const UNKNOWN_SIGNAL: &str = "unknown";

// =============================================================================
// PEER -> SERVER
// =============================================================================

/// Messages a peer sends to its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Raw keystrokes for the shell.
    TtyInput { data: String },
    /// New window size.
    TtyResize { data: ResizeData },
    /// Liveness probe, answered with `pong`.
    Ping,
    /// Any `type` this server does not know. Ignored.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeData {
    pub cols: u16,
    pub rows: u16,
}

/// A frame that could not be turned into a [`ClientMessage`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid resize {cols}x{rows}: columns and rows must be positive")]
    InvalidSize { cols: u16, rows: u16 },

    #[error("binary frames are not supported")]
    Binary,
}

/// Parse and validate one text frame.
pub fn decode(text: &str) -> Result<ClientMessage, DecodeError> {
    let msg: ClientMessage = serde_json::from_str(text)?;
    if let ClientMessage::TtyResize { data } = &msg {
        if data.cols == 0 || data.rows == 0 {
            return Err(DecodeError::InvalidSize {
                cols: data.cols,
                rows: data.rows,
            });
        }
    }
    Ok(msg)
}

// =============================================================================
// SERVER -> PEER
// =============================================================================

/// Messages the server sends to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once, after the shell has started.
    Connection { message: String, timestamp: String },
    /// A chunk of shell output.
    TtyData { data: String },
    /// The shell exited. Last message of a session.
    TtyExit {
        #[serde(rename = "exitCode")]
        exit_code: i32,
        signal: String,
    },
    Pong { timestamp: String },
    /// The session could not be started.
    Error { message: String },
}

impl ServerMessage {
    pub fn connection() -> Self {
        Self::Connection {
            message: CONNECTION_GREETING.to_string(),
            timestamp: now(),
        }
    }

    pub fn pong() -> Self {
        Self::Pong { timestamp: now() }
    }

    pub fn exit(info: &ExitInfo) -> Self {
        Self::TtyExit {
            exit_code: info.code,
            signal: info
                .signal
                .clone()
                .unwrap_or_else(|| UNKNOWN_SIGNAL.to_string()),
        }
    }

    /// Encode as a WebSocket text frame.
    pub fn to_frame(&self) -> Result<Message, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(Message::Text(json.into()))
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// =============================================================================
// TESTS
// =============================================================================
