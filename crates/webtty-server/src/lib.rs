//! webtty server: remote shell sessions for browser terminals.
//!
//! A browser connects over WebSocket, gets its own shell in a fresh pty, and
//! exchanges JSON control messages with it (see [`protocol`]).
//!
//! - [`transport::Server`] accepts sockets and assigns identities.
//! - [`registry::Registry`] owns the table of live sessions.
//! - [`session::Session`] bridges one socket and one shell.

pub mod lifecycle;
pub mod options;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use lifecycle::{Lifecycle, SessionState};
pub use options::spawn_options;
pub use protocol::{ClientMessage, DecodeError, ServerMessage};
pub use registry::{Registry, ShuttingDown};
pub use session::{CloseReason, Session, SessionEnd, SessionError};
pub use transport::Server;
