//! Pseudo-terminal backed shell processes.
//!
//! [`PtyProcess`] owns one child process attached to a pty. Output is read
//! on a background thread and delivered through [`PtyOutput`]; the exit
//! status arrives exactly once through [`PtyExit`].

pub mod pty;
pub mod shell;
pub mod utf8;

pub use pty::{
    ExitInfo, PtyError, PtyExit, PtyOutput, PtyProcess, SpawnOptions, SpawnedPty, TtySize,
    DEFAULT_COLS, DEFAULT_ROWS, PTY_READ_CHUNK,
};
pub use utf8::Utf8Decoder;
