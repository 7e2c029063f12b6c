//! Process launching with merged standard streams.

use std::ffi::OsStr;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

use crate::error::GdbPilotError;
use crate::Result;

/// A handle to a spawned child process.
///
/// `reader` yields the child's stdout and stderr interleaved as one stream;
/// `writer` feeds the child's stdin.
pub struct ProcessHandle {
    /// Reader for the merged output stream.
    pub reader: Box<dyn Read + Send>,
    /// Writer for the child's input stream.
    pub writer: Box<dyn Write + Send>,
    /// The underlying child process.
    pub child: Child,
}

impl ProcessHandle {
    /// Process ID of the spawned child.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Block until the child exits.
    pub fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait()
    }

    /// Check for exit without blocking.
    pub fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.child.id())
            .finish_non_exhaustive()
    }
}

/// Captured result of a one-shot tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit status of the tool.
    pub status: ExitStatus,
    /// Combined stdout and stderr text.
    pub output: String,
}

impl ToolOutput {
    /// Check if the tool exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or -1 when the process was terminated by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// Spawn `program` with `args`, stdin piped and stdout/stderr merged.
///
/// Fails with [`GdbPilotError::Spawn`] when the executable cannot be
/// started; no partial handles are retained in that case.
pub fn spawn_merged<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> Result<ProcessHandle> {
    let spawn_err = |source: std::io::Error| GdbPilotError::Spawn {
        program: program.display().to_string(),
        source,
    };

    let (reader, writer) = os_pipe::pipe().map_err(spawn_err)?;
    let writer_clone = writer.try_clone().map_err(spawn_err)?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::from(writer))
        .stderr(Stdio::from(writer_clone));

    let mut child = cmd.spawn().map_err(spawn_err)?;
    // The Command still owns duplicate write ends; EOF on `reader` depends
    // on closing them.
    drop(cmd);

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| spawn_err(std::io::Error::other("child stdin was not captured")))?;

    tracing::debug!(program = %program.display(), pid = child.id(), "spawned");

    Ok(ProcessHandle {
        reader: Box::new(reader),
        writer: Box::new(stdin),
        child,
    })
}

/// Run `program` with `args` to completion, capturing its merged output.
///
/// Reads the output stream to EOF before waiting so a chatty child cannot
/// fill the pipe and deadlock.
pub fn run_capture<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> Result<ToolOutput> {
    let mut handle = spawn_merged(program, args)?;

    // One-shot tools get no input; close stdin so none of them block on it.
    handle.writer = Box::new(std::io::sink());

    let mut raw = Vec::new();
    handle.reader.read_to_end(&mut raw)?;
    let status = handle.wait()?;

    Ok(ToolOutput {
        status,
        output: String::from_utf8_lossy(&raw).into_owned(),
    })
}

/// Probe a tool's version string by invoking it with `--version`.
///
/// Diagnostic only; this is not part of the debugger session protocol.
pub fn probe_version(program: &Path) -> Result<ToolOutput> {
    run_capture(program, &["--version"])
}
