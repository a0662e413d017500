//! Process-wide table of live sessions keyed by connection identity.
//!
//! `connect` and `disconnect` for one identity are serialized by a per-identity
//! async lock, so they never interleave for the same id while unrelated ids
//! proceed in parallel. The map itself sits behind a short-lived std mutex that
//! is never held across an `.await`; a session removes its own entry through it
//! once it reaches `Closed`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use webtty_common::ConnectionId;
use webtty_pty::SpawnOptions;

use crate::lifecycle::{Lifecycle, SessionState};
use crate::session::Session;

/// Returned by [`Registry::connect`] once [`Registry::shutdown_all`] has run.
#[derive(Debug, thiserror::Error)]
#[error("registry is shutting down")]
pub struct ShuttingDown;

struct Entry {
    /// Distinguishes a replaced session from its successor under the same id.
    generation: u64,
    cancel: CancellationToken,
    lifecycle: Arc<Lifecycle>,
    task: JoinHandle<()>,
}

impl Entry {
    /// Ask the session to tear down and wait until it is `Closed`.
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Session task failed");
        }
    }
}

#[derive(Default)]
struct Table {
    entries: HashMap<ConnectionId, Entry>,
    closed: bool,
}

type IdentityLock = Arc<tokio::sync::Mutex<()>>;

struct Inner {
    options: Arc<SpawnOptions>,
    table: Mutex<Table>,
    identity_locks: Mutex<HashMap<ConnectionId, IdentityLock>>,
    next_generation: AtomicU64,
}

/// Cheap to clone; all clones share one table.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Every session started by this registry spawns its shell with `options`.
    pub fn new(options: SpawnOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options: Arc::new(options),
                table: Mutex::new(Table::default()),
                identity_locks: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Start a session for `id` on `ws`.
    ///
    /// An existing session under the same id is torn down completely before
    /// the new one starts. Returns as soon as the new session is running.
    pub async fn connect<S>(&self, id: ConnectionId, ws: WebSocketStream<S>) -> Result<(), ShuttingDown>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let guard = self.lock_identity(&id).await;
        let result = self.replace(id.clone(), ws).await;
        self.release_identity(&id, guard);
        result
    }

    async fn replace<S>(&self, id: ConnectionId, ws: WebSocketStream<S>) -> Result<(), ShuttingDown>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let previous = {
            let mut table = self.table();
            if table.closed {
                return Err(ShuttingDown);
            }
            table.entries.remove(&id)
        };
        if let Some(previous) = previous {
            tracing::info!(session = %id.short(), "Replacing existing session");
            previous.stop().await;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let session = Session::new(id.clone(), Arc::clone(&self.inner.options), cancel.clone());
        let lifecycle = session.lifecycle();

        // Insert under the same lock the task's self-removal needs, so the
        // removal can never run before the insert.
        let mut table = self.table();
        if table.closed {
            return Err(ShuttingDown);
        }
        let registry = self.clone();
        let task_id = id.clone();
        let task = tokio::spawn(async move {
            match session.run(ws).await {
                Ok(end) => {
                    tracing::debug!(
                        session = %task_id.short(),
                        reason = ?end.reason,
                        shell_signalled = end.shell_signalled,
                        "Session ended"
                    );
                }
                Err(e) => {
                    tracing::warn!(session = %task_id.short(), error = %e, "Session ended with error");
                }
            }
            registry.remove_if(&task_id, generation);
        });
        table.entries.insert(
            id,
            Entry {
                generation,
                cancel,
                lifecycle,
                task,
            },
        );
        tracing::debug!(sessions = table.entries.len(), "Session registered");
        Ok(())
    }

    /// Tear down the session for `id`, if any, and wait for it to close.
    /// Returns whether a session was found. Safe to call repeatedly.
    pub async fn disconnect(&self, id: &ConnectionId) -> bool {
        let guard = self.lock_identity(id).await;
        let entry = self.table().entries.remove(id);
        let found = match entry {
            Some(entry) => {
                entry.stop().await;
                true
            }
            None => false,
        };
        self.release_identity(id, guard);
        found
    }

    /// Tear down every session and refuse new ones.
    pub async fn shutdown_all(&self) {
        let entries: Vec<Entry> = {
            let mut table = self.table();
            table.closed = true;
            table.entries.drain().map(|(_, entry)| entry).collect()
        };
        if entries.is_empty() {
            return;
        }
        tracing::info!(sessions = entries.len(), "Closing all sessions");
        for entry in &entries {
            entry.cancel.cancel();
        }
        futures_util::future::join_all(entries.into_iter().map(Entry::stop)).await;
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.table().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().entries.is_empty()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.table().entries.contains_key(id)
    }

    /// Current state of the session registered under `id`.
    pub fn state(&self, id: &ConnectionId) -> Option<SessionState> {
        self.table()
            .entries
            .get(id)
            .map(|entry| entry.lifecycle.state())
    }

    /// Remove `id` only if it still belongs to `generation`.
    fn remove_if(&self, id: &ConnectionId, generation: u64) -> bool {
        let mut table = self.table();
        if table.entries.get(id).map(|e| e.generation) == Some(generation) {
            table.entries.remove(id);
            tracing::debug!(session = %id.short(), sessions = table.entries.len(), "Session removed");
            true
        } else {
            false
        }
    }

    async fn lock_identity(&self, id: &ConnectionId) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.identity_locks().entry(id.clone()).or_default());
        lock.lock_owned().await
    }

    /// Drop the guard, and the lock itself once nobody else is waiting on it.
    fn release_identity(&self, id: &ConnectionId, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.identity_locks();
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.inner
            .table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn identity_locks(&self) -> MutexGuard<'_, HashMap<ConnectionId, IdentityLock>> {
        self.inner
            .identity_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// =============================================================================
// TESTS
// =============================================================================
