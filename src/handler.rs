//! Break handler strategies.
//!
//! A [`BreakHandler`] is the application-supplied capability the dispatch
//! loop invokes at each breakpoint hit. The handler runs inline: the loop is
//! suspended for its whole duration, mirroring the debugged program being
//! paused. A handler must eventually resume execution (or quit), or the
//! session stalls indefinitely.

use std::io::{self, BufRead};

use crate::session::DebugSession;
use crate::Result;

/// Capability invoked synchronously on each detected breakpoint hit.
///
/// Handlers may issue further commands through the session (`backtrace`,
/// `resume`, `quit`) before returning. Injected as a strategy object so test
/// doubles can assert invocation count and ordering.
pub trait BreakHandler {
    /// Handle one breakpoint hit.
    fn on_break(&mut self, session: &mut DebugSession) -> Result<()>;
}

/// Built-in handler that prints the backtrace and resumes immediately.
#[derive(Debug, Default)]
pub struct AutoHandler;

impl AutoHandler {
    /// Create an auto handler.
    pub fn new() -> Self {
        Self
    }
}

impl BreakHandler for AutoHandler {
    fn on_break(&mut self, session: &mut DebugSession) -> Result<()> {
        let backtrace = session.backtrace()?;
        println!("Breakpoint hit with backtrace: {backtrace}");
        session.resume()
    }
}

/// Built-in handler that waits for interactive commands.
///
/// Accepts `bt` (print the backtrace) and `resume` (continue and return);
/// anything else reprompts. Reads from an injectable line source so tests
/// can script the interaction; [`ManualHandler::stdin`] wires it to the
/// process's standard input.
pub struct ManualHandler {
    input: Box<dyn BufRead + Send>,
}

impl ManualHandler {
    /// Create a manual handler reading commands from `input`.
    pub fn new(input: Box<dyn BufRead + Send>) -> Self {
        Self { input }
    }

    /// Create a manual handler reading commands from standard input.
    pub fn stdin() -> Self {
        Self::new(Box::new(io::BufReader::new(io::stdin())))
    }
}

impl BreakHandler for ManualHandler {
    fn on_break(&mut self, session: &mut DebugSession) -> Result<()> {
        println!("Breakpoint hit. Type 'bt' to print the backtrace or 'resume' to continue.");
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                // Input exhausted; resume so the session can finish instead
                // of stalling at the breakpoint.
                tracing::warn!("command input exhausted at breakpoint, resuming");
                return session.resume();
            }
            match line.trim() {
                "bt" => {
                    let backtrace = session.backtrace()?;
                    println!("{backtrace}");
                }
                "resume" => return session.resume(),
                _ => println!("Invalid command. Please use 'bt' or 'resume'."),
            }
        }
    }
}

impl std::fmt::Debug for ManualHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualHandler").finish_non_exhaustive()
    }
}
