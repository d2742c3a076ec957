//! Error types for Reel.

use std::process::ExitStatus;
use thiserror::Error;

/// Library-level error type for Reel operations.
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("No usable input: {0}")]
    NoInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ReelError {
    /// Build a `ToolFailed` error, keeping only the tail of long diagnostics.
    pub fn tool_failed(tool: &str, status: ExitStatus, stderr: &[u8]) -> Self {
        ReelError::ToolFailed {
            tool: tool.to_string(),
            status,
            stderr: stderr_tail(&String::from_utf8_lossy(stderr), 20),
        }
    }
}

/// Last `max_lines` non-empty lines of tool output.
fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

/// Result type alias for Reel operations.
pub type Result<T> = std::result::Result<T, ReelError>;
