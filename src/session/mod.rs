//! Debug session management module.
//!
//! This module holds the core of the crate: the breakpoint registry types,
//! the text channel to and from the debugger, the session state machine,
//! and the controller that orchestrates a session from spawn to
//! termination.

mod breakpoint;
mod channel;
mod controller;
mod state;

pub use breakpoint::BreakpointSpec;
pub use channel::{CommandChannel, ResponseScanner};
pub use controller::{DebugController, DebugSession, BREAK_HIT_MARKER, TERMINAL_MARKER};
pub use state::SessionState;
