//! Recording toolchain for tests.
//!
//! Simulates the observable file effects of ffmpeg and yt-dlp: remux copies
//! the input, concat joins the files listed in the manifest, muxing writes a
//! marker, and downloads create `<stem>.<ext>` from the output template.

use super::{Tool, ToolOutput, Toolchain};
use crate::error::{ReelError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recorded tool invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool: Tool,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn joined(&self) -> String {
        self.args.join(" ")
    }
}

#[derive(Default)]
pub struct FakeToolchain {
    calls: Mutex<Vec<Invocation>>,
    spawned: Mutex<Vec<(PathBuf, Vec<String>)>>,
    /// Extension the fake downloader produces; `None` produces nothing.
    download_extension: Option<String>,
    /// Fail any transcoder call whose arguments contain this text.
    fail_transcoder_on: Option<String>,
    /// Programs reported as present on PATH.
    installed: Vec<String>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self {
            download_extension: Some("webm".to_string()),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_transcoder_on = Some(needle.to_string());
        self
    }

    pub fn downloading(mut self, extension: Option<&str>) -> Self {
        self.download_extension = extension.map(str::to_string);
        self
    }

    pub fn with_installed(mut self, program: &str) -> Self {
        self.installed.push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, tool: Tool) -> Vec<Invocation> {
        self.calls().into_iter().filter(|c| c.tool == tool).collect()
    }

    pub fn spawned(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.spawned.lock().unwrap().clone()
    }

    fn transcode(&self, args: &[String]) -> Result<()> {
        if let Some(needle) = &self.fail_transcoder_on {
            if args.iter().any(|a| a.contains(needle.as_str())) {
                return Err(failure("ffmpeg", "Invalid data found when processing input"));
            }
        }

        let output = PathBuf::from(args.last().expect("output argument"));
        let inputs: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| flag.as_str() == "-i")
            .map(|(_, value)| value)
            .collect();

        let bytes = if args.iter().any(|a| a == "concat") {
            let manifest = std::fs::read_to_string(inputs[0])?;
            let mut joined = Vec::new();
            for line in manifest.lines() {
                joined.extend(std::fs::read(parse_manifest_line(line))?);
            }
            joined
        } else if inputs.len() == 1 {
            std::fs::read(inputs[0])?
        } else {
            format!("muxed {} + {}", inputs[0], inputs[1]).into_bytes()
        };

        std::fs::write(output, bytes)?;
        Ok(())
    }

    fn download(&self, args: &[String]) -> Result<()> {
        let template_pos = args.iter().position(|a| a == "-o").expect("-o flag") + 1;
        if let Some(ext) = &self.download_extension {
            let target = args[template_pos].replace("%(ext)s", ext);
            std::fs::write(target, b"downloaded audio")?;
        }
        Ok(())
    }
}

/// Path named by a concat demuxer `file '...'` line.
pub fn parse_manifest_line(line: &str) -> PathBuf {
    let quoted = line
        .strip_prefix("file '")
        .and_then(|rest| rest.strip_suffix('\''))
        .expect("manifest line format");
    PathBuf::from(quoted.replace("'\\''", "'"))
}

#[cfg(unix)]
fn failure(tool: &str, stderr: &str) -> ReelError {
    use std::os::unix::process::ExitStatusExt;
    ReelError::tool_failed(tool, std::process::ExitStatus::from_raw(1 << 8), stderr.as_bytes())
}

#[cfg(not(unix))]
fn failure(tool: &str, stderr: &str) -> ReelError {
    use std::os::windows::process::ExitStatusExt;
    ReelError::tool_failed(tool, std::process::ExitStatus::from_raw(1), stderr.as_bytes())
}

#[async_trait]
impl Toolchain for FakeToolchain {
    async fn run(&self, tool: Tool, args: &[OsString]) -> Result<ToolOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        self.calls.lock().unwrap().push(Invocation {
            tool,
            args: args.clone(),
        });

        match tool {
            Tool::Transcoder => self.transcode(&args)?,
            Tool::Downloader => self.download(&args)?,
        }
        Ok(ToolOutput::default())
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .iter()
            .any(|p| p == program)
            .then(|| Path::new("/usr/bin").join(program))
    }

    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> Result<()> {
        self.spawned.lock().unwrap().push((
            program.to_path_buf(),
            args.iter().map(|a| a.to_string_lossy().to_string()).collect(),
        ));
        Ok(())
    }
}
