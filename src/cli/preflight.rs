//! Pre-flight checks before touching the filesystem.
//!
//! Verifies the external tools a run needs can be executed, so a missing
//! transcoder is reported before any file is deleted or created.

use crate::config::Settings;
use crate::error::{ReelError, Result};
use std::process::{Command, Stdio};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Building a montage needs the transcoder, and the downloader when the
    /// soundtrack is remote.
    Montage { remote: bool },
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Montage { remote } => {
            check_tool(&settings.tools.ffmpeg)?;
            if remote {
                check_tool(&settings.tools.ytdlp)?;
            }
        }
    }
    Ok(())
}

/// Flag ffmpeg-family tools accept for printing their version.
pub fn version_arg(program: &str) -> &'static str {
    let name = std::path::Path::new(program)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(program);
    match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

/// Check if an external tool is available.
fn check_tool(program: &str) -> Result<()> {
    let status = Command::new(program)
        .arg(version_arg(program))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => Err(ReelError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            program
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ReelError::ToolNotFound(program.to_string()))
        }
        Err(e) => Err(ReelError::ToolNotFound(format!("{}: {}", program, e))),
    }
}
