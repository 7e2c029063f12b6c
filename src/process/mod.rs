//! Subprocess plumbing for the driven tools.
//!
//! This module spawns child processes with their standard output and
//! standard error merged into a single pipe, the way the rest of the crate
//! expects to observe them: one interleaved stream of text lines.

mod launcher;

pub use launcher::{probe_version, run_capture, spawn_merged, ProcessHandle, ToolOutput};
