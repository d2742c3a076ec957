//! Montage command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{MontageArgs, Output};
use crate::config::Settings;
use crate::discovery;
use crate::pipeline::{AudioTrack, Balance, MixMode, MontageReport, MontageRequest, Pipeline, Playback};
use anyhow::Result;

/// Fold command-line overrides into the loaded settings.
pub fn apply_overrides(args: &MontageArgs, settings: &mut Settings) {
    if let Some(name) = &args.output {
        settings.general.output_name = name.clone();
    }
    if let Some(jobs) = args.jobs {
        settings.normalize.max_concurrent = jobs;
    }
    if args.no_play {
        settings.player.enabled = false;
    }
}

/// Balance requested on the command line; a bare `--balance` takes the
/// configured default.
pub fn requested_balance(args: &MontageArgs, settings: &Settings) -> Result<Option<Balance>> {
    match args.balance {
        None => Ok(None),
        Some(Some(balance)) => Ok(Some(balance)),
        Some(None) => Ok(Some(Balance::new(settings.mixing.default_balance)?)),
    }
}

/// Run the montage pipeline.
pub async fn run_montage(args: &MontageArgs, mut settings: Settings) -> Result<()> {
    apply_overrides(args, &mut settings);
    settings.validate()?;

    // Pre-flight checks
    let remote = args.youtube.is_some();
    if let Err(e) = preflight::check(Operation::Montage { remote }, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'reel doctor' for detailed diagnostics.");
        std::process::exit(1);
    }

    let request = MontageRequest {
        workdir: Settings::expand_path(&args.dir),
        youtube: args.youtube.clone(),
        balance: requested_balance(args, &settings)?,
    };

    Output::info(&format!("Building montage in {}", request.workdir.display()));

    let pipeline = Pipeline::new(settings);
    match pipeline.run(&request).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Montage failed: {}", e));
            std::process::exit(1);
        }
    }
}

fn print_report(report: &MontageReport) {
    Output::success(&format!("Montage written to {}", report.output.display()));

    Output::kv("Clips", &report.clips.len().to_string());
    for name in discovery::file_names(&report.clips) {
        Output::list_item(&name);
    }

    match (&report.soundtrack, report.mode) {
        (Some(track), Some(mode)) => {
            let source = match track {
                AudioTrack::Downloaded(_) => "downloaded",
                AudioTrack::Local(_) => "local",
            };
            let name = track
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Output::kv("Soundtrack", &format!("{} ({})", name, source));
            let mode = match mode {
                MixMode::Replace => "replaced clip audio".to_string(),
                MixMode::Mix(balance) => format!("mixed at {}", balance),
            };
            Output::kv("Audio", &mode);
        }
        _ => Output::info("No audio files found, kept the clip audio."),
    }

    match &report.playback {
        Playback::Launched { program } => Output::info(&format!("Opened in {}", program)),
        Playback::NotInstalled { program } => {
            Output::warning(&format!("{} is not installed, skipping playback.", program))
        }
        Playback::Disabled => {}
        Playback::Failed(e) => Output::warning(&format!("Could not start the player: {}", e)),
    }
}
