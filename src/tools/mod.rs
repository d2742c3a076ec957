//! External tool abstraction.
//!
//! Every transcoder and downloader invocation goes through the [`Toolchain`]
//! trait, so the pipeline never spawns processes directly and can be driven
//! by a fake in tests. Invocations are argument vectors; nothing is passed
//! through a shell.

pub mod ffmpeg;
pub mod ytdlp;

#[cfg(test)]
pub(crate) mod fake;

use crate::config::Settings;
use crate::error::{ReelError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// External tools the pipeline waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Media transcoder (ffmpeg).
    Transcoder,
    /// Media downloader (yt-dlp).
    Downloader,
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tool::Transcoder => write!(f, "transcoder"),
            Tool::Downloader => write!(f, "downloader"),
        }
    }
}

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Trait for running external tools.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Run `tool` with `args` and wait for it to exit.
    ///
    /// A non-zero exit is returned as [`ReelError::ToolFailed`] with the
    /// captured diagnostics; a missing executable as [`ReelError::ToolNotFound`].
    async fn run(&self, tool: Tool, args: &[OsString]) -> Result<ToolOutput>;

    /// Look up `program` on the command search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Start `program` detached from our stdio and do not wait for it.
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> Result<()>;
}

/// Toolchain backed by real processes.
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    ffmpeg: String,
    ytdlp: String,
}

impl SystemToolchain {
    pub fn new(ffmpeg: impl Into<String>, ytdlp: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ytdlp: ytdlp.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.tools.ffmpeg, &settings.tools.ytdlp)
    }

    fn program(&self, tool: Tool) -> &str {
        match tool {
            Tool::Transcoder => &self.ffmpeg,
            Tool::Downloader => &self.ytdlp,
        }
    }
}

#[async_trait]
impl Toolchain for SystemToolchain {
    #[instrument(skip(self, args))]
    async fn run(&self, tool: Tool, args: &[OsString]) -> Result<ToolOutput> {
        let program = self.program(tool);
        debug!("Running {} {:?}", program, args);

        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReelError::ToolNotFound(program.to_string()));
            }
            Err(e) => return Err(ReelError::Io(e)),
        };

        if !output.status.success() {
            return Err(ReelError::tool_failed(program, output.status, &output.stderr));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!("{}: {}", program, line);
        }

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> Result<()> {
        let mut cmd = std::process::Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group, so a Ctrl-C in our terminal leaves the player alone.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReelError::ToolNotFound(program.display().to_string())
            } else {
                ReelError::Io(e)
            }
        })?;
        debug!("Spawned {} (pid {})", program.display(), child.id());
        Ok(())
    }
}
