//! Doctor command - verify external tools and configuration.

use crate::cli::preflight::version_arg;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::{Command, Stdio};

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Reel Doctor");
    println!();
    println!("Checking external tools and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_checks = vec![
        check_tool("ffmpeg", &settings.tools.ffmpeg, install_hint_ffmpeg()),
        // Only needed for --youtube, so a missing downloader is a warning.
        downgrade(check_tool("yt-dlp", &settings.tools.ytdlp, install_hint_ytdlp())),
        check_player(&settings.player.program),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_temp_dir(&settings.temp_dir());
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Reel.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Reel is ready to use.");
    }

    Ok(())
}

/// Check if an external tool runs and report its version line.
fn check_tool(name: &str, program: &str, hint: &str) -> CheckResult {
    let output = Command::new(program)
        .arg(version_arg(program))
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

fn downgrade(mut check: CheckResult) -> CheckResult {
    if check.status == CheckStatus::Error {
        check.status = CheckStatus::Warning;
    }
    check
}

/// The player is only located, never run, so a GUI does not pop up.
fn check_player(program: &str) -> CheckResult {
    match which::which(program) {
        Ok(path) => CheckResult::ok(program, &path.display().to_string()),
        Err(_) => CheckResult::warning(
            program,
            "not installed",
            "Montages are still built; install the player or use --no-play",
        ),
    }
}

fn check_temp_dir(dir: &Path) -> CheckResult {
    if !dir.exists() {
        return CheckResult::warning(
            "Scratch base",
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first run",
        );
    }

    match tempfile::Builder::new().prefix("reel-doctor-").tempdir_in(dir) {
        Ok(trial) => {
            let trial_path = trial.path().to_path_buf();
            write_check_outcome(dir, &trial_path, trial.close())
        }
        Err(e) => CheckResult::error(
            "Scratch base",
            &format!("{} is not writable: {}", dir.display(), e),
            "Set general.temp_dir to a writable directory",
        ),
    }
}

fn write_check_outcome(dir: &Path, trial: &Path, closed: std::io::Result<()>) -> CheckResult {
    match closed {
        Ok(()) => CheckResult::ok("Scratch base", &dir.display().to_string()),
        Err(e) => CheckResult::warning(
            "Scratch base",
            &format!("{} left behind: {}", trial.display(), e),
            "Check permissions on the scratch base and remove the directory",
        ),
    }
}

fn check_config_file(path: &Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok("Config file", &path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: reel config edit",
        )
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
