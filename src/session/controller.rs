//! The session controller: spawn, configure, dispatch, terminate.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Child;

use tracing::{debug, error, info, warn};

use super::breakpoint::BreakpointSpec;
use super::channel::{CommandChannel, ResponseScanner};
use super::state::SessionState;
use crate::error::GdbPilotError;
use crate::handler::BreakHandler;
use crate::process::{self, ProcessHandle, ToolOutput};
use crate::Result;

/// Substring marking a breakpoint-hit output line.
///
/// Matched case-sensitively against raw output, in GDB's exact wording.
pub const BREAK_HIT_MARKER: &str = "hit Breakpoint";

/// Substring marking a thread/process-termination output line.
pub const TERMINAL_MARKER: &str = "[Thread";

/// Number of framing lines discarded after a breakpoint-hit line.
///
/// Tied to one exact version of GDB's output formatting: the source line
/// echo and the blank line that follow the hit announcement. Wrong for any
/// other format, and kept that way on purpose.
const POST_HIT_SKIP_LINES: usize = 2;

/// One spawn-to-termination lifetime of the debugger process.
///
/// Binds the process handle, its command channel, and its response scanner.
/// Handlers receive `&mut DebugSession` at each breakpoint so they can issue
/// further commands before execution resumes.
pub struct DebugSession {
    channel: CommandChannel,
    scanner: ResponseScanner,
    child: Option<Child>,
}

impl DebugSession {
    /// Spawn the debugger with the target as its argument.
    pub fn spawn(gdb_path: &Path, target: &Path) -> Result<Self> {
        let ProcessHandle {
            reader,
            writer,
            child,
        } = process::spawn_merged(gdb_path, &[target.as_os_str()])?;

        Ok(Self {
            channel: CommandChannel::new(writer),
            scanner: ResponseScanner::new(reader),
            child: Some(child),
        })
    }

    /// Assemble a session over arbitrary streams, without a child process.
    ///
    /// This is how embedders and tests drive the dispatch machinery against
    /// scripted output.
    pub fn from_streams(writer: Box<dyn Write + Send>, reader: Box<dyn Read + Send>) -> Self {
        Self {
            channel: CommandChannel::new(writer),
            scanner: ResponseScanner::new(reader),
            child: None,
        }
    }

    /// Process ID of the debugger, if one was spawned.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Send one command line through the channel.
    pub fn send(&mut self, command: &str) -> Result<()> {
        self.channel.send(command)
    }

    /// Read the next output line; `None` means end-of-stream.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        self.scanner.next_line()
    }

    /// Resume execution after a breakpoint.
    ///
    /// Sends `continue` and reads nothing back; the dispatch loop consumes
    /// whatever results.
    pub fn resume(&mut self) -> Result<()> {
        self.send("continue")
    }

    /// Fetch the backtrace.
    ///
    /// Sends `bt` and returns exactly the next output line. A genuinely
    /// multi-line backtrace is truncated to its first line.
    pub fn backtrace(&mut self) -> Result<String> {
        self.send("bt")?;
        match self.scanner.next_line()? {
            Some(line) => Ok(line),
            None => Err(GdbPilotError::ChannelIo(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "debugger closed its output before answering bt",
            ))),
        }
    }

    /// Send `quit` unconditionally.
    ///
    /// Does not release the process handle; outside the dispatch loop this
    /// is a best-effort signal only.
    pub fn quit(&mut self) -> Result<()> {
        self.send("quit")
    }

    fn release(&mut self) {
        if let Some(child) = self.child.take() {
            debug!(pid = child.id(), "released debugger process handle");
        }
    }
}

impl std::fmt::Debug for DebugSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSession")
            .field("pid", &self.pid())
            .finish_non_exhaustive()
    }
}

/// Orchestrates debug sessions against a single GDB executable.
///
/// Lifecycle: construct, configure (`load`, `add_breakpoint`,
/// `set_break_handler`), then `start()`, which blocks in the dispatch loop
/// until the debugged program terminates. At most one session is live at a
/// time and the controller owns it exclusively.
pub struct DebugController {
    gdb_path: PathBuf,
    target: Option<PathBuf>,
    breakpoints: Vec<BreakpointSpec>,
    handler: Option<Box<dyn BreakHandler>>,
    echo: bool,
    state: SessionState,
    session: Option<DebugSession>,
    faulted: bool,
}

impl DebugController {
    /// Create a controller driving the given GDB executable.
    pub fn new(gdb_path: impl Into<PathBuf>) -> Self {
        Self {
            gdb_path: gdb_path.into(),
            target: None,
            breakpoints: Vec::new(),
            handler: None,
            echo: false,
            state: SessionState::Idle,
            session: None,
            faulted: false,
        }
    }

    /// Path of the driven GDB executable.
    pub fn gdb_path(&self) -> &Path {
        &self.gdb_path
    }

    /// Point the controller at a different GDB executable.
    pub fn set_gdb_path(&mut self, path: impl Into<PathBuf>) {
        self.gdb_path = path.into();
    }

    /// Record the target program to debug. Later loads overwrite.
    ///
    /// The path is not validated here; a bad target surfaces when the
    /// debugger is started.
    pub fn load(&mut self, path: impl Into<PathBuf>) {
        self.target = Some(path.into());
    }

    /// The currently loaded target, if any.
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// Append a breakpoint spec.
    ///
    /// Valid any time before `start()`, including after a previous session
    /// terminated. Duplicates are kept and sent separately.
    pub fn add_breakpoint(&mut self, file: impl AsRef<str>, line: u32) {
        self.breakpoints.push(BreakpointSpec::new(file, line));
    }

    /// Registered breakpoint specs, in insertion order.
    pub fn breakpoints(&self) -> &[BreakpointSpec] {
        &self.breakpoints
    }

    /// Install the break handler, overwriting any previous one.
    pub fn set_break_handler(&mut self, handler: Box<dyn BreakHandler>) {
        self.handler = Some(handler);
    }

    /// Toggle echoing of raw debugger output lines from the dispatch loop.
    pub fn set_echo(&mut self, on: bool) {
        self.echo = on;
    }

    /// Whether raw debugger output is echoed.
    pub fn echo(&self) -> bool {
        self.echo
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the previous session ended with an I/O failure.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Start a debug session and run it to completion.
    ///
    /// Spawns the debugger with the target as its argument, applies every
    /// registered breakpoint in insertion order, sends `run`, then blocks in
    /// the dispatch loop until the debugged program terminates, the stream
    /// ends, or the channel fails. The break handler is invoked inline on
    /// each breakpoint hit; a handler that never returns stalls the session
    /// indefinitely.
    pub fn start(&mut self) -> Result<()> {
        if self.target.is_none() {
            return Err(GdbPilotError::NoTargetLoaded);
        }
        if !self.breakpoints.is_empty() && self.handler.is_none() {
            return Err(GdbPilotError::HandlerMissing);
        }
        if self.faulted {
            return Err(GdbPilotError::SessionFaulted);
        }
        if !self.state.can_transition_to(SessionState::Starting) {
            return Err(GdbPilotError::InvalidStateTransition {
                from: self.state,
                to: SessionState::Starting,
            });
        }

        let target = self.target.clone().ok_or(GdbPilotError::NoTargetLoaded)?;
        let session = DebugSession::spawn(&self.gdb_path, &target)?;
        info!(program = %target.display(), pid = ?session.pid(), "debug session starting");

        self.state.transition_to(SessionState::Starting)?;
        self.session = Some(session);

        if let Err(err) = self.send_startup_commands() {
            return self.abort(err);
        }
        self.state.transition_to(SessionState::Running)?;

        self.dispatch_loop()
    }

    /// Resume execution after a breakpoint.
    ///
    /// Sends exactly one `continue`. With no live channel this is a no-op,
    /// logged at debug level.
    pub fn resume(&mut self) -> Result<()> {
        match self.session.as_mut() {
            Some(session) => session.resume(),
            None => {
                debug!("resume ignored: no active session");
                Ok(())
            }
        }
    }

    /// Fetch the backtrace from the live session.
    pub fn backtrace(&mut self) -> Result<String> {
        match self.session.as_mut() {
            Some(session) => session.backtrace(),
            None => Err(GdbPilotError::SessionNotActive),
        }
    }

    /// Send `quit` unconditionally.
    ///
    /// Does not transition state or release the process handle; those are
    /// the dispatch loop's responsibility on the clean path. With no live
    /// channel this is a no-op, logged at debug level.
    pub fn quit(&mut self) -> Result<()> {
        match self.session.as_mut() {
            Some(session) => session.quit(),
            None => {
                debug!("quit ignored: no active session");
                Ok(())
            }
        }
    }

    /// Return the controller to a reconfigurable state.
    ///
    /// Clears the target, the breakpoint registry, the handler, and the
    /// fault latch. Any lingering process handle is dropped, not killed;
    /// real cleanup is the embedding application's call.
    pub fn reset(&mut self) {
        self.target = None;
        self.breakpoints.clear();
        self.handler = None;
        self.session = None;
        self.state = SessionState::Idle;
        self.faulted = false;
        info!("controller reset");
    }

    /// Probe the debugger's version string.
    ///
    /// Runs `gdb --version` as a separate, non-piped invocation; diagnostic
    /// only, not part of the session protocol.
    pub fn probe_version(&self) -> Result<ToolOutput> {
        process::probe_version(&self.gdb_path)
    }

    /// Send one `break <location>` per registered spec, then `run`.
    fn send_startup_commands(&mut self) -> Result<()> {
        let commands: Vec<String> = self
            .breakpoints
            .iter()
            .map(BreakpointSpec::command)
            .collect();
        let session = self.active_session()?;
        for command in &commands {
            session.send(command)?;
        }
        session.send("run")
    }

    /// The read-classify-act cycle run while the session lives.
    fn dispatch_loop(&mut self) -> Result<()> {
        loop {
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => return self.finish("end of stream"),
                Err(err) => return self.abort(err),
            };

            if self.echo {
                println!("{line}");
            }

            if line.contains(TERMINAL_MARKER) {
                return self.finish("terminal marker");
            }

            if line.contains(BREAK_HIT_MARKER) {
                // Fixed framing: the source echo and blank line after the
                // hit announcement never reach the handler.
                for _ in 0..POST_HIT_SKIP_LINES {
                    if let Err(err) = self.read_line() {
                        return self.abort(err);
                    }
                }

                self.state.transition_to(SessionState::AtBreakpoint)?;
                if let (Some(handler), Some(session)) =
                    (self.handler.as_mut(), self.session.as_mut())
                {
                    if let Err(err) = handler.on_break(session) {
                        return self.abort(err);
                    }
                }
                self.state.transition_to(SessionState::Running)?;
            }
            // any other line: no action
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.active_session()?.next_line()
    }

    fn active_session(&mut self) -> Result<&mut DebugSession> {
        self.session.as_mut().ok_or(GdbPilotError::SessionNotActive)
    }

    /// Clean shutdown: the only path that sends `quit`.
    fn finish(&mut self, reason: &str) -> Result<()> {
        self.state.transition_to(SessionState::Terminated)?;
        if let Some(session) = self.session.as_mut() {
            if let Err(err) = session.quit() {
                warn!(error = %err, "failed to send quit to debugger");
            }
            session.release();
        }
        self.session = None;
        info!(reason, "debug session terminated");
        Ok(())
    }

    /// Channel failure: exit immediately, without sending `quit`.
    fn abort(&mut self, err: GdbPilotError) -> Result<()> {
        error!(error = %err, "debug session aborted");
        self.state.transition_to(SessionState::Terminated)?;
        self.faulted = true;
        self.session = None;
        Err(err)
    }
}

impl std::fmt::Debug for DebugController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugController")
            .field("gdb_path", &self.gdb_path)
            .field("target", &self.target)
            .field("breakpoints", &self.breakpoints)
            .field("state", &self.state)
            .field("faulted", &self.faulted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }

        fn lines(&self) -> Vec<String> {
            self.contents().lines().map(str::to_string).collect()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Reader that yields scripted bytes, then fails instead of EOF.
    struct ScriptThenFail {
        data: Cursor<Vec<u8>>,
    }

    impl ScriptThenFail {
        fn new(script: &str) -> Self {
            Self {
                data: Cursor::new(script.as_bytes().to_vec()),
            }
        }
    }

    impl Read for ScriptThenFail {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(std::io::Error::other("stream failure")),
                n => Ok(n),
            }
        }
    }

    struct CountingHandler {
        hits: Arc<AtomicUsize>,
    }

    impl BreakHandler for CountingHandler {
        fn on_break(&mut self, _session: &mut DebugSession) -> crate::Result<()> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ResumingHandler {
        hits: Arc<AtomicUsize>,
    }

    impl BreakHandler for ResumingHandler {
        fn on_break(&mut self, session: &mut DebugSession) -> crate::Result<()> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            session.resume()
        }
    }

    fn scripted_controller(script: &str, buf: &SharedBuf) -> DebugController {
        let mut controller = DebugController::new("gdb");
        controller.session = Some(DebugSession::from_streams(
            Box::new(buf.clone()),
            Box::new(Cursor::new(script.as_bytes().to_vec())),
        ));
        controller
    }

    const HIT_LINE: &str = "Thread 1 \"prog\" hit Breakpoint 1, main () at prog.c:4";
    const TERMINAL_LINE: &str = "[Thread 0x7ffff7d99740 (LWP 1000) exited]";

    #[test]
    fn test_start_without_target() {
        let mut controller = DebugController::new("gdb");
        let err = controller.start().unwrap_err();
        assert!(matches!(err, GdbPilotError::NoTargetLoaded));
        // no process spawned, state unchanged
        assert!(controller.session.is_none());
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_with_breakpoints_but_no_handler() {
        let mut controller = DebugController::new("gdb");
        controller.load("prog");
        controller.add_breakpoint("prog.c", 4);
        let err = controller.start().unwrap_err();
        assert!(matches!(err, GdbPilotError::HandlerMissing));
        assert!(controller.session.is_none());
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_spawn_failure_leaves_state_idle() {
        let mut controller = DebugController::new("/nonexistent/gdb");
        controller.load("prog");
        let err = controller.start().unwrap_err();
        assert!(matches!(err, GdbPilotError::Spawn { .. }));
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(!controller.is_faulted());
    }

    #[test]
    fn test_startup_commands_order() {
        let buf = SharedBuf::default();
        let mut controller = scripted_controller("", &buf);
        controller.add_breakpoint("main.c", 1);
        controller.add_breakpoint("util.c", 2);
        // duplicates are sent as separate commands
        controller.add_breakpoint("main.c", 1);

        controller.send_startup_commands().unwrap();

        assert_eq!(
            buf.lines(),
            vec!["break main.c:1", "break util.c:2", "break main.c:1", "run"]
        );
    }

    #[test]
    fn test_dispatch_hit_then_terminal() {
        let hits = Arc::new(AtomicUsize::new(0));
        let script = format!(
            "before\n{HIT_LINE}\n4\t    int x = 0;\n\n{TERMINAL_LINE}\nafter\n"
        );

        let buf = SharedBuf::default();
        let mut controller = scripted_controller(&script, &buf);
        controller.set_break_handler(Box::new(CountingHandler { hits: hits.clone() }));
        controller.state = SessionState::Running;

        controller.dispatch_loop().unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), SessionState::Terminated);
        assert!(controller.session.is_none());
        // quit sent exactly once, and nothing else
        assert_eq!(buf.lines(), vec!["quit"]);
    }

    #[test]
    fn test_dispatch_skips_exactly_two_framing_lines() {
        let hits = Arc::new(AtomicUsize::new(0));
        // The two framing lines also carry the hit marker. If they were
        // classified instead of discarded, the handler would fire three
        // times.
        let script = format!("{HIT_LINE}\n{HIT_LINE}\n{HIT_LINE}\n{TERMINAL_LINE}\n");

        let buf = SharedBuf::default();
        let mut controller = scripted_controller(&script, &buf);
        controller.set_break_handler(Box::new(CountingHandler { hits: hits.clone() }));
        controller.state = SessionState::Running;

        controller.dispatch_loop().unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_handler_commands_reach_channel() {
        let hits = Arc::new(AtomicUsize::new(0));
        let script = format!("{HIT_LINE}\nframe\n\n{TERMINAL_LINE}\n");

        let buf = SharedBuf::default();
        let mut controller = scripted_controller(&script, &buf);
        controller.set_break_handler(Box::new(ResumingHandler { hits: hits.clone() }));
        controller.state = SessionState::Running;

        controller.dispatch_loop().unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(buf.lines(), vec!["continue", "quit"]);
    }

    #[test]
    fn test_dispatch_eof_terminates_cleanly() {
        let buf = SharedBuf::default();
        let mut controller = scripted_controller("just output\nmore output\n", &buf);
        controller.state = SessionState::Running;

        controller.dispatch_loop().unwrap();

        assert_eq!(controller.state(), SessionState::Terminated);
        assert!(!controller.is_faulted());
        assert_eq!(buf.lines(), vec!["quit"]);
    }

    #[test]
    fn test_dispatch_read_failure_skips_quit() {
        let buf = SharedBuf::default();
        let mut controller = DebugController::new("gdb");
        controller.session = Some(DebugSession::from_streams(
            Box::new(buf.clone()),
            Box::new(ScriptThenFail::new("some output\n")),
        ));
        controller.state = SessionState::Running;

        let err = controller.dispatch_loop().unwrap_err();

        assert!(matches!(err, GdbPilotError::ChannelIo(_)));
        assert_eq!(controller.state(), SessionState::Terminated);
        assert!(controller.is_faulted());
        // asymmetric from the clean path: no quit on the failure path
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn test_faulted_controller_refuses_start() {
        let mut controller = DebugController::new("gdb");
        controller.load("prog");
        controller.faulted = true;
        controller.state = SessionState::Terminated;

        let err = controller.start().unwrap_err();
        assert!(matches!(err, GdbPilotError::SessionFaulted));
    }

    #[test]
    fn test_reset_clears_configuration_and_fault() {
        let mut controller = DebugController::new("gdb");
        controller.load("prog");
        controller.add_breakpoint("prog.c", 1);
        controller.faulted = true;
        controller.state = SessionState::Terminated;

        controller.reset();

        assert!(controller.target().is_none());
        assert!(controller.breakpoints().is_empty());
        assert!(!controller.is_faulted());
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_resume_without_session_is_noop() {
        let mut controller = DebugController::new("gdb");
        assert!(controller.resume().is_ok());
    }

    #[test]
    fn test_quit_without_session_is_noop() {
        let mut controller = DebugController::new("gdb");
        assert!(controller.quit().is_ok());
    }

    #[test]
    fn test_backtrace_without_session() {
        let mut controller = DebugController::new("gdb");
        let err = controller.backtrace().unwrap_err();
        assert!(matches!(err, GdbPilotError::SessionNotActive));
    }

    #[test]
    fn test_breakpoints_kept_in_insertion_order() {
        let mut controller = DebugController::new("gdb");
        controller.add_breakpoint("b.c", 2);
        controller.add_breakpoint("a.c", 1);
        let locations: Vec<_> = controller
            .breakpoints()
            .iter()
            .map(|bp| bp.location.as_str())
            .collect();
        assert_eq!(locations, vec!["b.c:2", "a.c:1"]);
    }

    #[test]
    fn test_load_overwrites_target() {
        let mut controller = DebugController::new("gdb");
        controller.load("first");
        controller.load("second");
        assert_eq!(controller.target(), Some(Path::new("second")));
    }
}
