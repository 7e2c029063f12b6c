//! The text channel to and from the debugger.
//!
//! [`CommandChannel`] owns the write side: one command per line, flushed
//! immediately so every command is visible to the child before the next
//! read. [`ResponseScanner`] owns the read side: a blocking, forward-only
//! sequence of output lines that ends when the child closes its streams.

use std::io::{BufRead, BufReader, Read, Write};

use crate::Result;

/// Write-and-flush abstraction over the child's input stream.
pub struct CommandChannel {
    writer: Box<dyn Write + Send>,
}

impl CommandChannel {
    /// Create a channel over an arbitrary writer.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    /// Send one command line.
    ///
    /// Appends the line terminator and flushes before returning; the channel
    /// never buffers across calls.
    pub fn send(&mut self, command: &str) -> Result<()> {
        tracing::trace!(command, "send");
        self.writer.write_all(command.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel").finish_non_exhaustive()
    }
}

/// Blocking line-read abstraction over the child's merged output stream.
///
/// The sequence is finite and forward-only: once `next_line` returns
/// `Ok(None)` the stream is exhausted, and a new session needs a new
/// scanner.
pub struct ResponseScanner {
    reader: BufReader<Box<dyn Read + Send>>,
}

impl ResponseScanner {
    /// Create a scanner over an arbitrary reader.
    pub fn new(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Block until the next line, end-of-stream (`None`), or an I/O error.
    ///
    /// The trailing line terminator is stripped.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        match self.reader.read_line(&mut line)? {
            0 => Ok(None),
            _ => {
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                tracing::trace!(line = %line, "recv");
                Ok(Some(line))
            }
        }
    }
}

impl std::fmt::Debug for ResponseScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseScanner").finish_non_exhaustive()
    }
}
