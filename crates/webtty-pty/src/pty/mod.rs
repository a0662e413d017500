//! PTY management using the `portable-pty` crate.
//!
//! Provides [`PtyProcess`] for spawning a shell inside a pseudo-terminal,
//! writing input, resizing, and lifecycle management. Output and exit are
//! split off into [`PtyOutput`] and [`PtyExit`] so they can be consumed by a
//! different task than the one issuing writes.

mod process;
mod streams;
mod types;

pub use process::*;
pub use streams::*;
pub use types::*;
