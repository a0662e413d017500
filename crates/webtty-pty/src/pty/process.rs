//! Spawning and controlling the pty child.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty};
use tokio::sync::{mpsc, oneshot};

use super::streams::{PtyExit, PtyOutput};
use super::types::{ExitInfo, PtyError, SpawnOptions, TtySize, PTY_READ_CHUNK};
use crate::shell::ALLOWED_ENV_VARS;

// =============================================================================
// PTY PROCESS
// =============================================================================

/// A single shell process bound to a pseudo-terminal.
///
/// Owns the master side of the pty pair. Three background threads serve it:
/// `pty-reader` (output into [`PtyOutput`]), `pty-writer` (queued input into
/// the pty), and `pty-wait` (child exit into [`PtyExit`]).
///
/// Dropping the handle kills the child.
pub struct PtyProcess {
    master: Box<dyn MasterPty + Send>,
    input_tx: mpsc::UnboundedSender<Vec<u8>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    pid: Option<u32>,
    size: TtySize,
    alive: Arc<AtomicBool>,
    kill_sent: bool,
}

/// Result of a successful spawn: the control handle plus its two streams.
pub struct SpawnedPty {
    pub process: PtyProcess,
    pub output: PtyOutput,
    pub exit: PtyExit,
}

impl PtyProcess {
    /// Spawn `opts.program` attached to a new pty of `opts.size`.
    pub fn spawn(opts: &SpawnOptions) -> Result<SpawnedPty, PtyError> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(opts.size.to_pty_size())
            .map_err(|e| PtyError::SpawnFailed(format!("failed to open PTY: {e}")))?;

        let cmd = build_command(opts);
        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::SpawnFailed(format!("'{}': {e}", opts.program)))?;

        // Only the child keeps the slave open; EOF on the master then tracks its lifetime.
        drop(pair.slave);

        let pid = child.process_id();
        let killer = child.clone_killer();

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to clone PTY reader: {e}")))?;
        let mut writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to take PTY writer: {e}")))?;

        let (output_tx, output_rx) = mpsc::channel::<Vec<u8>>(opts.output_queue.max(1));
        thread::Builder::new()
            .name("pty-reader".into())
            .spawn(move || {
                let mut buf = [0u8; PTY_READ_CHUNK];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if output_tx.blocking_send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            // EIO once the last slave fd closes
                            tracing::trace!("PTY reader finished: {e}");
                            break;
                        }
                    }
                }
            })
            .map_err(|e| PtyError::SpawnFailed(format!("failed to spawn PTY reader thread: {e}")))?;

        let (input_tx, mut input_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        thread::Builder::new()
            .name("pty-writer".into())
            .spawn(move || {
                while let Some(data) = input_rx.blocking_recv() {
                    if let Err(e) = writer.write_all(&data).and_then(|_| writer.flush()) {
                        tracing::debug!("PTY write failed: {e}");
                        break;
                    }
                }
            })
            .map_err(|e| PtyError::SpawnFailed(format!("failed to spawn PTY writer thread: {e}")))?;

        let alive = Arc::new(AtomicBool::new(true));
        let (exit_tx, exit_rx) = oneshot::channel();
        let wait_alive = Arc::clone(&alive);
        thread::Builder::new()
            .name("pty-wait".into())
            .spawn(move || {
                let info = match child.wait() {
                    Ok(status) => ExitInfo::from_status(&status),
                    Err(e) => {
                        tracing::debug!("PTY wait error: {e}");
                        ExitInfo::unknown()
                    }
                };
                wait_alive.store(false, Ordering::SeqCst);
                let _ = exit_tx.send(info);
            })
            .map_err(|e| PtyError::SpawnFailed(format!("failed to spawn PTY wait thread: {e}")))?;

        tracing::debug!(pid = ?pid, program = %opts.program, "PTY spawned");

        Ok(SpawnedPty {
            process: PtyProcess {
                master: pair.master,
                input_tx,
                killer,
                pid,
                size: opts.size,
                alive,
                kill_sent: false,
            },
            output: PtyOutput { rx: output_rx },
            exit: PtyExit { rx: exit_rx },
        })
    }

    /// OS process id of the child, when the platform exposes it.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Current window size.
    pub fn size(&self) -> TtySize {
        self.size
    }

    /// `false` once the child has been reaped.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Queue raw bytes for the child's input. Never blocks: the bytes are
    /// handed to the writer thread, which feeds them to the pty in order.
    pub fn write(&self, data: &[u8]) -> Result<(), PtyError> {
        if !self.is_alive() {
            return Err(PtyError::Closed);
        }
        self.input_tx
            .send(data.to_vec())
            .map_err(|_| PtyError::Closed)
    }

    /// Change the pty window size. The child gets `SIGWINCH`; nothing else
    /// about it changes.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError> {
        let size = TtySize::new(cols, rows)?;
        if !self.is_alive() {
            return Err(PtyError::Closed);
        }
        self.master
            .resize(size.to_pty_size())
            .map_err(|e| PtyError::ResizeFailed(e.to_string()))?;
        self.size = size;
        Ok(())
    }

    /// Send a kill signal to the child. Idempotent.
    ///
    /// Returns `true` only for the call that actually delivered the signal.
    /// Exit is reported asynchronously through [`PtyExit`].
    pub fn terminate(&mut self) -> bool {
        if self.kill_sent {
            return false;
        }
        self.kill_sent = true;
        if !self.is_alive() {
            return false;
        }
        if let Err(e) = self.killer.kill() {
            tracing::debug!("PTY kill error (may already be dead): {e}");
            return false;
        }
        true
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

// =============================================================================
// COMMAND
// =============================================================================

fn build_command(opts: &SpawnOptions) -> CommandBuilder {
    let mut cmd = CommandBuilder::new(&opts.program);
    cmd.args(&opts.args);

    if !opts.inherit_env {
        cmd.env_clear();
        for key in ALLOWED_ENV_VARS {
            if let Ok(val) = std::env::var(key) {
                cmd.env(key, val);
            }
        }
    }

    cmd.env("TERM", &opts.term);
    for (key, value) in &opts.env {
        cmd.env(key, value);
    }

    match &opts.working_dir {
        Some(dir) => cmd.cwd(dir),
        None => {
            if let Ok(dir) = std::env::current_dir() {
                cmd.cwd(dir);
            }
        }
    }

    cmd
}

// =============================================================================
// TESTS
// =============================================================================
