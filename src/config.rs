//! Configuration management for gdb-pilot.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Args;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Toolchain configuration.
    pub tools: ToolsSection,
    /// Debugger session configuration.
    pub debugger: DebuggerSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Toolchain configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// Path to the GDB executable.
    pub gdb: PathBuf,
    /// Path to the GCC executable.
    pub gcc: PathBuf,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            gdb: PathBuf::from("gdb"),
            gcc: PathBuf::from("gcc"),
        }
    }
}

impl ToolsSection {
    /// Resolve both tools inside one toolchain directory.
    pub fn set_toolchain_dir(&mut self, dir: &Path) {
        self.gdb = dir.join(format!("gdb{}", std::env::consts::EXE_SUFFIX));
        self.gcc = dir.join(format!("gcc{}", std::env::consts::EXE_SUFFIX));
    }
}

/// Debugger session configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerSection {
    /// Echo raw debugger output lines from the dispatch loop.
    pub echo_output: bool,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(gdb) = std::env::var("GDB_PILOT_GDB") {
            if !gdb.is_empty() {
                self.tools.gdb = PathBuf::from(gdb);
            }
        }

        if let Ok(gcc) = std::env::var("GDB_PILOT_GCC") {
            if !gcc.is_empty() {
                self.tools.gcc = PathBuf::from(gcc);
            }
        }

        if let Ok(level) = std::env::var("GDB_PILOT_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref dir) = args.toolchain_dir {
            self.tools.set_toolchain_dir(dir);
        }

        if let Some(ref gdb) = args.gdb {
            self.tools.gdb = gdb.clone();
        }

        if let Some(ref gcc) = args.gcc {
            self.tools.gcc = gcc.clone();
        }

        if args.echo {
            self.debugger.echo_output = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Config::default();

        // Load from config file if specified
        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        // Apply environment variable overrides
        config.apply_env();

        // Apply CLI argument overrides (highest priority)
        config.apply_args(args);

        Ok(config)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
