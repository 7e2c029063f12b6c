//! # gdb-pilot
//!
//! Drive GDB as a line-oriented subprocess with scriptable breakpoint
//! handling.
//!
//! This crate spawns the debugger with its output streams merged, sends it
//! textual commands over stdin, classifies its output lines, and hands
//! control to an application-supplied break handler at each breakpoint hit.
//! The whole model is single-threaded and synchronous: the dispatch loop
//! blocks on the debugger's output, and the debugger is effectively paused
//! while a handler runs.
//!
//! ## Features
//!
//! - **Session controller**: spawn, apply breakpoints, run, classify,
//!   dispatch, terminate
//! - **Break handler strategies**: automatic backtrace-and-resume, or an
//!   interactive command loop
//! - **Toolchain glue**: one-shot gcc invocation with captured output
//!
//! ## Quick Start
//!
//! ```no_run
//! use gdb_pilot::{AutoHandler, Compiler, DebugController};
//!
//! fn main() -> gdb_pilot::Result<()> {
//!     // Initialize logging
//!     gdb_pilot::logging::try_init().ok();
//!
//!     // Build the target with debug info
//!     let compiler = Compiler::new("gcc");
//!     let target = compiler.compile("prog.c")?;
//!
//!     // Configure and run a debug session
//!     let mut controller = DebugController::new("gdb");
//!     controller.load(target);
//!     controller.add_breakpoint("prog.c", 4);
//!     controller.set_break_handler(Box::new(AutoHandler::new()));
//!     controller.start()?;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod process;
pub mod session;
pub mod toolchain;

// Re-export commonly used types
pub use error::{GdbPilotError, Result};
pub use handler::{AutoHandler, BreakHandler, ManualHandler};
pub use process::{ProcessHandle, ToolOutput};
pub use session::{
    BreakpointSpec, CommandChannel, DebugController, DebugSession, ResponseScanner, SessionState,
};
pub use toolchain::Compiler;
