//! PTY value types, spawn options, and errors.

use std::collections::HashMap;
use std::path::PathBuf;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Maximum bytes read from the pty in a single `read` call (8 KB).
pub const PTY_READ_CHUNK: usize = 8_192;

/// Default terminal columns.
pub const DEFAULT_COLS: u16 = 80;

/// Default terminal rows.
pub const DEFAULT_ROWS: u16 = 30;

/// Default depth of the output queue between the reader thread and the consumer.
pub const DEFAULT_OUTPUT_QUEUE: usize = 256;

// =============================================================================
// ERROR
// =============================================================================

/// Errors originating from PTY operations.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    #[error("failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("process has already exited")]
    Closed,

    #[error("invalid terminal size {cols}x{rows}: columns and rows must be positive")]
    InvalidSize { cols: u16, rows: u16 },

    #[error("failed to resize PTY: {0}")]
    ResizeFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// =============================================================================
// SIZE
// =============================================================================

/// Terminal window size in character cells. Both dimensions are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtySize {
    cols: u16,
    rows: u16,
}

impl TtySize {
    pub fn new(cols: u16, rows: u16) -> Result<Self, PtyError> {
        if cols == 0 || rows == 0 {
            return Err(PtyError::InvalidSize { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub(crate) fn to_pty_size(self) -> portable_pty::PtySize {
        portable_pty::PtySize {
            rows: self.rows,
            cols: self.cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

impl Default for TtySize {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

// =============================================================================
// EXIT
// =============================================================================

/// How the child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitInfo {
    pub code: i32,
    /// Terminating signal, when the platform reports one.
    pub signal: Option<String>,
}

impl ExitInfo {
    /// Used when the wait itself failed and no status is available.
    pub fn unknown() -> Self {
        Self {
            code: -1,
            signal: None,
        }
    }

    pub(crate) fn from_status(status: &portable_pty::ExitStatus) -> Self {
        Self {
            code: status.exit_code() as i32,
            signal: status.signal().map(str::to_string),
        }
    }
}

// =============================================================================
// SPAWN OPTIONS
// =============================================================================

/// Everything needed to start a shell in a fresh pty.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub program: String,
    pub args: Vec<String>,
    pub size: TtySize,
    /// `None` inherits the current directory of this process.
    pub working_dir: Option<PathBuf>,
    /// Pass this process's whole environment through. When false only
    /// [`crate::shell::ALLOWED_ENV_VARS`] are inherited.
    pub inherit_env: bool,
    /// Value for `TERM`.
    pub term: String,
    /// Extra variables, applied last.
    pub env: HashMap<String, String>,
    /// Output chunks buffered before the reader thread blocks.
    pub output_queue: usize,
}

impl SpawnOptions {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            size: TtySize::default(),
            working_dir: None,
            inherit_env: true,
            term: "xterm-color".into(),
            env: HashMap::new(),
            output_queue: DEFAULT_OUTPUT_QUEUE,
        }
    }
}
