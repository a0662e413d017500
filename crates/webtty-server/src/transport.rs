//! TCP listener and WebSocket handshake.
//!
//! Each accepted socket gets a fresh [`ConnectionId`] and is handed to the
//! [`Registry`]. Frame decoding happens inside the session; the endpoint
//! holds no per-session state.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_tungstenite::accept_async;
use tokio_util::sync::CancellationToken;
use webtty_common::ConnectionId;

use crate::registry::Registry;

/// Upper bound on the WebSocket upgrade of one connection.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Server {
    listener: TcpListener,
    registry: Registry,
}

impl Server {
    pub async fn bind(addr: impl ToSocketAddrs, registry: Registry) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, registry })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires, then close every session.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let registry = self.registry.clone();
                        tokio::spawn(handle_socket(stream, peer, registry));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "TCP accept error");
                    }
                }
            }
        }

        tracing::info!(sessions = self.registry.len(), "Shutting down");
        self.registry.shutdown_all().await;
    }
}

async fn handle_socket(stream: TcpStream, peer: SocketAddr, registry: Registry) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
    }

    let ws = match tokio::time::timeout(HANDSHAKE_TIMEOUT, accept_async(stream)).await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => {
            tracing::warn!(peer = %peer, error = %e, "WS handshake failed");
            return;
        }
        Err(_) => {
            tracing::warn!(peer = %peer, "WS handshake timeout");
            return;
        }
    };

    let id = ConnectionId::new();
    tracing::info!(peer = %peer, session = %id.short(), "Peer connected");
    if let Err(e) = registry.connect(id, ws).await {
        tracing::debug!(peer = %peer, error = %e, "Connection refused");
    }
}
