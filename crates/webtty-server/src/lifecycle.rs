//! Session state machine: `Connecting -> Active -> Closing -> Closed`.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Shell is being spawned.
    Connecting = 0,
    /// Both relay directions are running.
    Active = 1,
    /// Teardown in progress.
    Closing = 2,
    /// Shell gone, peer released. Terminal.
    Closed = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Active,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Shared, lock-free view of a session's state.
///
/// Transitions only move forward. [`Lifecycle::begin_closing`] succeeds for
/// exactly one caller, which then owns teardown.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Connecting as u8),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `Connecting -> Active`. Fails if teardown already started.
    pub fn activate(&self) -> bool {
        self.state
            .compare_exchange(
                SessionState::Connecting as u8,
                SessionState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to `Closing` from `Connecting` or `Active`. Returns `true` only
    /// for the caller that made the transition.
    pub fn begin_closing(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current >= SessionState::Closing as u8 {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                SessionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn mark_closed(&self) {
        self.state.store(SessionState::Closed as u8, Ordering::Release);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn happy_path_transitions() {
        let lc = Lifecycle::new();
        assert_eq!(lc.state(), SessionState::Connecting);
        assert!(lc.activate());
        assert_eq!(lc.state(), SessionState::Active);
        assert!(!lc.activate());
        assert!(lc.begin_closing());
        assert_eq!(lc.state(), SessionState::Closing);
        lc.mark_closed();
        assert_eq!(lc.state(), SessionState::Closed);
    }

    #[test]
    fn spawn_failure_skips_active() {
        let lc = Lifecycle::new();
        assert!(lc.begin_closing());
        assert!(!lc.activate());
        lc.mark_closed();
        assert_eq!(lc.state().to_string(), "closed");
    }

    #[test]
    fn begin_closing_fires_once_under_contention() {
        let lc = Arc::new(Lifecycle::new());
        lc.activate();
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let lc = Arc::clone(&lc);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if lc.begin_closing() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(lc.state(), SessionState::Closing);
    }
}
