//! One-shot compiler invocation.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::GdbPilotError;
use crate::process::{self, ToolOutput};
use crate::Result;

/// Source file suffix stripped when deriving an output path.
pub const SOURCE_SUFFIX: &str = ".c";

/// Wrapper around the C compiler used to build debuggable targets.
///
/// Each call is one attempt: spawn, wait, capture the combined output,
/// report success or failure by exit code. No retry.
#[derive(Debug, Clone)]
pub struct Compiler {
    gcc_path: PathBuf,
}

impl Compiler {
    /// Create a compiler wrapper around the given gcc executable.
    pub fn new(gcc_path: impl Into<PathBuf>) -> Self {
        Self {
            gcc_path: gcc_path.into(),
        }
    }

    /// Path of the wrapped gcc executable.
    pub fn gcc_path(&self) -> &Path {
        &self.gcc_path
    }

    /// Point the wrapper at a different gcc executable.
    pub fn set_gcc_path(&mut self, path: impl Into<PathBuf>) {
        self.gcc_path = path.into();
    }

    /// Compile `source`, deriving the output path from it.
    ///
    /// Returns the derived output path on success.
    pub fn compile(&self, source: &str) -> Result<String> {
        let output = output_path_for(source).to_string();
        self.compile_to(source, &output)?;
        Ok(output)
    }

    /// Compile `source` into an explicit `output` path with debug info.
    pub fn compile_to(&self, source: &str, output: &str) -> Result<ToolOutput> {
        let args = compile_args(source, output);
        debug!(gcc = %self.gcc_path.display(), ?args, "compiling");

        let capture = process::run_capture(&self.gcc_path, &args)?;
        if capture.success() {
            info!(source, output, "compiled");
            if !capture.output.is_empty() {
                debug!(output = %capture.output, "compiler output");
            }
            Ok(capture)
        } else {
            Err(GdbPilotError::Compile {
                code: capture.code(),
                output: capture.output,
            })
        }
    }

    /// Probe the compiler's version string.
    pub fn probe_version(&self) -> Result<ToolOutput> {
        process::probe_version(&self.gcc_path)
    }
}

/// Derive the output path by removing one trailing source suffix occurrence.
///
/// A source without the suffix keeps its name unchanged; the toolchain then
/// reports the resulting failure.
pub fn output_path_for(source: &str) -> &str {
    source.strip_suffix(SOURCE_SUFFIX).unwrap_or(source)
}

/// The fixed argument template: debug info, output flag, output, source.
fn compile_args<'a>(source: &'a str, output: &'a str) -> [&'a str; 4] {
    ["-g", "-o", output, source]
}
