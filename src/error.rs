//! Error types for gdb-pilot.

use thiserror::Error;

/// Main error type for gdb-pilot operations.
#[derive(Error, Debug)]
pub enum GdbPilotError {
    /// start() was called without a loaded target program.
    #[error("no target loaded: load a program before starting the debugger")]
    NoTargetLoaded,

    /// Breakpoints are registered but no break handler is installed.
    #[error("breakpoints are set but no break handler is installed")]
    HandlerMissing,

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: crate::session::SessionState,
        to: crate::session::SessionState,
    },

    /// A tool executable could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// I/O failure on the command channel or the response scanner.
    #[error("debugger channel I/O error: {0}")]
    ChannelIo(#[from] std::io::Error),

    /// An operation needing a live session was called without one.
    #[error("no active debug session")]
    SessionNotActive,

    /// The previous session ended with an I/O failure and must be reset.
    #[error("previous session ended with an I/O failure: reset the controller before starting again")]
    SessionFaulted,

    /// The compiler exited with a nonzero status.
    #[error("compilation failed with exit code {code}:\n{output}")]
    Compile { code: i32, output: String },
}

/// Convenience Result type for gdb-pilot operations.
pub type Result<T> = std::result::Result<T, GdbPilotError>;
