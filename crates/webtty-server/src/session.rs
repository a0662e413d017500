//! One peer connection bound to one shell process.
//!
//! A session runs three tasks:
//!
//! - the session task itself reads peer frames and applies them to the
//!   shell (`peer -> process`), then owns teardown;
//! - the output pump turns pty output into `tty_data` frames and reports
//!   `tty_exit` (`process -> peer`);
//! - the writer owns the socket's send half and is the only place frames are
//!   written, so data, pongs and the close frame keep their queue order.
//!
//! A slow peer only stalls the writer. The pump keeps draining the pty into
//! the writer's queue.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use webtty_common::ConnectionId;
use webtty_pty::{PtyError, PtyExit, PtyOutput, PtyProcess, SpawnOptions, SpawnedPty, Utf8Decoder};

use crate::lifecycle::Lifecycle;
use crate::protocol::{self, ClientMessage, DecodeError, ServerMessage};

/// How long output is still collected after the shell's exit is observed.
pub const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(100);

/// How long the writer may take to flush the close frame during teardown.
pub const WRITER_GRACE: Duration = Duration::from_secs(1);

/// Why a session ended abnormally.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to start shell: {0}")]
    Spawn(#[from] PtyError),

    #[error("peer transport failed: {0}")]
    Transport(#[from] tungstenite::Error),
}

/// What ended a session that started its shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer sent a close frame or went away.
    PeerClosed,
    /// The shell exited and `tty_exit` was sent.
    ShellExited,
    /// The owner cancelled the session, or a peer write failed.
    Cancelled,
}

/// Outcome of a session that reached `Closed` normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnd {
    pub reason: CloseReason,
    /// Whether teardown delivered a kill signal to a still-running shell.
    pub shell_signalled: bool,
}

/// Item queued for the writer task.
#[derive(Debug)]
enum Outbound {
    Message(ServerMessage),
    Close,
}

type Outbox = mpsc::UnboundedSender<Outbound>;

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    id: ConnectionId,
    options: Arc<SpawnOptions>,
    cancel: CancellationToken,
    lifecycle: Arc<Lifecycle>,
}

impl Session {
    /// `cancel` is how the owner asks the session to tear down early.
    pub fn new(id: ConnectionId, options: Arc<SpawnOptions>, cancel: CancellationToken) -> Self {
        Self {
            id,
            options,
            cancel,
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.lifecycle)
    }

    /// Spawn the shell and relay until either side goes away.
    ///
    /// Returns once the session is `Closed`: the shell has been signalled,
    /// both relay tasks have stopped and the peer has been sent a close frame.
    pub async fn run<S>(self, ws: WebSocketStream<S>) -> Result<SessionEnd, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, mut stream) = ws.split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let mut writer = tokio::spawn(write_outbound(
            sink,
            out_rx,
            self.cancel.clone(),
            self.id.clone(),
        ));

        let SpawnedPty {
            mut process,
            output,
            exit,
        } = match self.spawn_shell().await {
            Ok(spawned) => spawned,
            Err(e) => {
                tracing::warn!(session = %self.id.short(), error = %e, "Shell spawn failed");
                self.lifecycle.begin_closing();
                let _ = out_tx.send(Outbound::Message(ServerMessage::Error {
                    message: e.to_string(),
                }));
                let _ = out_tx.send(Outbound::Close);
                drop(out_tx);
                finish_writer(&mut writer).await;
                self.lifecycle.mark_closed();
                return Err(SessionError::Spawn(e));
            }
        };

        tracing::info!(
            session = %self.id.short(),
            pid = ?process.pid(),
            program = %self.options.program,
            "Session started"
        );

        self.lifecycle.activate();
        let _ = out_tx.send(Outbound::Message(ServerMessage::connection()));

        let mut pump = tokio::spawn(pump_output(
            output,
            exit,
            out_tx.clone(),
            self.cancel.clone(),
            self.id.clone(),
        ));
        let mut pump_done = false;

        let outcome = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(session = %self.id.short(), "Session cancelled");
                    break Ok(CloseReason::Cancelled);
                }
                _ = &mut pump => {
                    pump_done = true;
                    break Ok(CloseReason::ShellExited);
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.handle_text(text.as_str(), &mut process, &out_tx);
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::warn!(
                            session = %self.id.short(),
                            error = %DecodeError::Binary,
                            "Dropping malformed message"
                        );
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(session = %self.id.short(), "Peer closed");
                        break Ok(CloseReason::PeerClosed);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(session = %self.id.short(), error = %e, "Peer read failed");
                        break Err(SessionError::Transport(e));
                    }
                }
            }
        };

        let shell_signalled = self.teardown(process, pump, pump_done, writer, out_tx).await;
        drop(stream);
        outcome.map(|reason| SessionEnd {
            reason,
            shell_signalled,
        })
    }

    /// openpty and fork/exec block, so they run off the async workers.
    async fn spawn_shell(&self) -> Result<SpawnedPty, PtyError> {
        let options = Arc::clone(&self.options);
        tokio::task::spawn_blocking(move || PtyProcess::spawn(&options))
            .await
            .map_err(|e| PtyError::SpawnFailed(format!("spawn task failed: {e}")))?
    }

    /// Apply one inbound text frame. Never fatal to the session.
    fn handle_text(&self, text: &str, process: &mut PtyProcess, out_tx: &Outbox) {
        match protocol::decode(text) {
            Ok(ClientMessage::TtyInput { data }) => {
                if data.is_empty() {
                    return;
                }
                if let Err(e) = process.write(data.as_bytes()) {
                    tracing::debug!(session = %self.id.short(), error = %e, "Input dropped");
                }
            }
            Ok(ClientMessage::TtyResize { data }) => match process.resize(data.cols, data.rows) {
                Ok(()) => {
                    tracing::debug!(
                        session = %self.id.short(),
                        cols = data.cols,
                        rows = data.rows,
                        "Resized"
                    );
                }
                Err(PtyError::Closed) => {}
                Err(e) => {
                    tracing::warn!(session = %self.id.short(), error = %e, "Resize failed");
                }
            },
            Ok(ClientMessage::Ping) => {
                let _ = out_tx.send(Outbound::Message(ServerMessage::pong()));
            }
            Ok(ClientMessage::Unknown) => {
                tracing::trace!(session = %self.id.short(), "Ignoring unknown message type");
            }
            Err(e) => {
                tracing::warn!(session = %self.id.short(), error = %e, "Dropping malformed message");
            }
        }
    }

    /// The single teardown path. Everything that ends a session funnels here.
    /// Returns whether the shell was signalled.
    async fn teardown(
        &self,
        mut process: PtyProcess,
        pump: JoinHandle<()>,
        pump_done: bool,
        mut writer: JoinHandle<()>,
        out_tx: Outbox,
    ) -> bool {
        if !self.lifecycle.begin_closing() {
            return false;
        }
        self.cancel.cancel();

        let signalled = process.terminate();
        if signalled {
            tracing::debug!(session = %self.id.short(), pid = ?process.pid(), "Shell signalled");
        }
        if !pump_done {
            pump.abort();
            let _ = pump.await;
        }

        let _ = out_tx.send(Outbound::Close);
        drop(out_tx);
        finish_writer(&mut writer).await;

        drop(process);
        self.lifecycle.mark_closed();
        tracing::info!(session = %self.id.short(), "Session closed");
        signalled
    }
}

// =============================================================================
// RELAY TASKS
// =============================================================================

/// `process -> peer`: forward output in order, then report the exit.
async fn pump_output(
    mut output: PtyOutput,
    mut exit: PtyExit,
    out_tx: Outbox,
    cancel: CancellationToken,
    id: ConnectionId,
) {
    let mut decoder = Utf8Decoder::new();

    let info = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            chunk = output.next_chunk() => match chunk {
                Some(bytes) => {
                    if !forward(&out_tx, &mut decoder, &bytes) {
                        return;
                    }
                }
                None => {
                    // EOF; the exit status follows shortly
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        info = &mut exit => break info,
                    }
                }
            },
            info = &mut exit => {
                drain_after_exit(&mut output, &out_tx, &mut decoder).await;
                break info;
            }
        }
    };

    let tail = decoder.finish();
    if !tail.is_empty() {
        let _ = out_tx.send(Outbound::Message(ServerMessage::TtyData { data: tail }));
    }

    tracing::info!(
        session = %id.short(),
        code = info.code,
        signal = info.signal.as_deref().unwrap_or("none"),
        "Shell exited"
    );
    let _ = out_tx.send(Outbound::Message(ServerMessage::exit(&info)));
}

/// Collect output still in flight when the exit was observed.
async fn drain_after_exit(output: &mut PtyOutput, out_tx: &Outbox, decoder: &mut Utf8Decoder) {
    let deadline = tokio::time::Instant::now() + EXIT_DRAIN_GRACE;
    while let Ok(Some(bytes)) = tokio::time::timeout_at(deadline, output.next_chunk()).await {
        if !forward(out_tx, decoder, &bytes) {
            break;
        }
    }
}

/// Returns `false` once the writer is gone.
fn forward(out_tx: &Outbox, decoder: &mut Utf8Decoder, bytes: &[u8]) -> bool {
    let data = decoder.decode(bytes);
    if data.is_empty() {
        return true;
    }
    out_tx
        .send(Outbound::Message(ServerMessage::TtyData { data }))
        .is_ok()
}

/// Sole owner of the socket's send half.
async fn write_outbound<S>(
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    cancel: CancellationToken,
    id: ConnectionId,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(item) = rx.recv().await {
        let (frame, closing) = match item {
            Outbound::Message(msg) => match msg.to_frame() {
                Ok(frame) => (frame, false),
                Err(e) => {
                    tracing::warn!(session = %id.short(), error = %e, "Failed to encode message");
                    continue;
                }
            },
            Outbound::Close => (Message::Close(None), true),
        };

        if let Err(e) = sink.send(frame).await {
            if !closing {
                tracing::debug!(session = %id.short(), error = %e, "Peer send failed");
                cancel.cancel();
            }
            return;
        }
        if closing {
            break;
        }
    }
    let _ = sink.close().await;
}

async fn finish_writer(writer: &mut JoinHandle<()>) {
    if tokio::time::timeout(WRITER_GRACE, &mut *writer).await.is_err() {
        writer.abort();
    }
}

// =============================================================================
// TESTS
// =============================================================================
