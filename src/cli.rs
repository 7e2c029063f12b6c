//! Command-line interface for gdb-pilot.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to the GDB executable.
    pub gdb: Option<PathBuf>,
    /// Path to the GCC executable.
    pub gcc: Option<PathBuf>,
    /// Directory holding both gdb and gcc executables.
    pub toolchain_dir: Option<PathBuf>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Echo raw debugger output from the dispatch loop.
    pub echo: bool,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Long("gdb") => {
                result.gdb = Some(parser.value()?.parse()?);
            }
            Long("gcc") => {
                result.gcc = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("toolchain-dir") => {
                result.toolchain_dir = Some(parser.value()?.parse()?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Short('e') | Long("echo") => {
                result.echo = true;
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"gdb-pilot {version}
Drive GDB as a line-oriented subprocess with scriptable breakpoint handling

USAGE:
    gdb-pilot [OPTIONS]

OPTIONS:
        --gdb <PATH>           Path to the GDB executable [default: gdb]
        --gcc <PATH>           Path to the GCC executable [default: gcc]
    -t, --toolchain-dir <DIR>  Directory holding both gdb and gcc
    -c, --config <FILE>        Path to configuration file (JSON)
    -l, --log-level <LVL>      Log level (error, warn, info, debug, trace)
    -e, --echo                 Echo raw debugger output
    -h, --help                 Print help
    -V, --version              Print version

ENVIRONMENT VARIABLES:
    GDB_PILOT_GDB              GDB path (overrides config)
    GDB_PILOT_GCC              GCC path (overrides config)
    GDB_PILOT_LOG_LEVEL        Log level (overrides config)
    RUST_LOG                   Alternative log level setting

EXAMPLES:
    # Start with tools resolved from PATH
    gdb-pilot

    # Start against a specific toolchain
    gdb-pilot -t /opt/toolchain/bin

    # Start with config file and verbose logging
    gdb-pilot -c ~/.config/gdb-pilot.json -l debug
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("gdb-pilot {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
