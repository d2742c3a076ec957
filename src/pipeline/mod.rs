//! Montage pipeline.
//!
//! Coordinates one run: discover clips, remux them into a scratch directory,
//! concatenate, lay a soundtrack over the result, clean up, and hand the
//! output to a player.

pub mod audio;
pub mod concat;
pub mod finalize;
pub mod normalize;
pub mod scratch;

pub use audio::{AudioTrack, Balance, MixMode};
pub use finalize::Playback;

use crate::config::Settings;
use crate::discovery;
use crate::error::{ReelError, Result};
use crate::tools::{SystemToolchain, Toolchain};
use finalize::Leftovers;
use scratch::Scratch;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};
use url::Url;

/// Inputs of one montage run.
#[derive(Debug, Clone)]
pub struct MontageRequest {
    /// Directory scanned for clips and audio, and where the output lands.
    pub workdir: PathBuf,
    /// Remote soundtrack; takes precedence over local audio files.
    pub youtube: Option<Url>,
    /// Mix the soundtrack under the montage audio instead of replacing it.
    pub balance: Option<Balance>,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct MontageReport {
    pub output: PathBuf,
    pub clips: Vec<PathBuf>,
    pub soundtrack: Option<AudioTrack>,
    pub mode: Option<MixMode>,
    pub playback: Playback,
}

/// Paths a run writes in the working directory.
struct Targets {
    workdir: PathBuf,
    combined: PathBuf,
    output: PathBuf,
}

/// The montage pipeline.
pub struct Pipeline {
    settings: Settings,
    tools: Arc<dyn Toolchain>,
}

impl Pipeline {
    /// Create a pipeline running the tools named in `settings`.
    pub fn new(settings: Settings) -> Self {
        let tools = Arc::new(SystemToolchain::from_settings(&settings));
        Self { settings, tools }
    }

    /// Create a pipeline with a custom toolchain.
    pub fn with_toolchain(settings: Settings, tools: Arc<dyn Toolchain>) -> Self {
        Self { settings, tools }
    }

    /// Build the montage for `request` and start playback.
    #[instrument(skip(self, request), fields(workdir = %request.workdir.display()))]
    pub async fn run(&self, request: &MontageRequest) -> Result<MontageReport> {
        let workdir = request.workdir.canonicalize().map_err(|e| {
            ReelError::InvalidInput(format!(
                "Working directory {}: {}",
                request.workdir.display(),
                e
            ))
        })?;
        let targets = Targets {
            combined: workdir.join(&self.settings.general.combined_name),
            output: workdir.join(&self.settings.general.output_name),
            workdir,
        };

        // Last run wins.
        finalize::remove_if_exists(&targets.output);
        finalize::remove_if_exists(&targets.combined);

        let clips = discovery::find_clips(&targets.workdir)?;
        if clips.is_empty() {
            return Err(ReelError::NoInput(format!(
                "no video clips found in {}",
                targets.workdir.display()
            )));
        }
        info!("Found {} clip(s)", clips.len());
        eprintln!("  Found {} clip(s)", clips.len());

        let scratch = Scratch::create(&self.settings.temp_dir())?;
        let mut soundtrack = None;
        let assembled = self
            .assemble(request, &targets, &clips, &scratch, &mut soundtrack)
            .await;

        finalize::cleanup(Leftovers {
            scratch: Some(scratch),
            combined: &targets.combined,
            soundtrack: soundtrack.as_ref(),
        });

        let mode = assembled?;
        eprintln!("  Output written: {}", targets.output.display());

        let playback = finalize::hand_off(self.tools.as_ref(), &self.settings.player, &targets.output);

        Ok(MontageReport {
            output: targets.output,
            clips,
            soundtrack,
            mode,
            playback,
        })
    }

    /// Normalize, concatenate and apply the soundtrack.
    ///
    /// The acquired track is stored in `soundtrack` as soon as it exists so
    /// cleanup can find it even when a later step fails.
    async fn assemble(
        &self,
        request: &MontageRequest,
        targets: &Targets,
        clips: &[PathBuf],
        scratch: &Scratch,
        soundtrack: &mut Option<AudioTrack>,
    ) -> Result<Option<MixMode>> {
        let tools = self.tools.as_ref();
        let loglevel = self.settings.tools.loglevel.as_str();

        let normalized = normalize::normalize_clips(
            tools,
            loglevel,
            clips,
            &scratch.clips_dir(),
            &self.settings.normalize.container,
            self.settings.normalize.max_concurrent,
        )
        .await?;

        let manifest = scratch.manifest_path();
        concat::write_manifest(&manifest, &normalized)?;
        eprintln!("  Combining {} clip(s)...", normalized.len());
        concat::concatenate(tools, loglevel, &manifest, &targets.combined).await?;

        *soundtrack = audio::acquire(
            tools,
            &self.settings.download,
            request.youtube.as_ref(),
            &targets.workdir,
            &scratch.audio_dir(),
        )
        .await?;

        match soundtrack.as_ref() {
            Some(track) => {
                let mode = MixMode::resolve(request.balance, self.settings.mixing.zero_balance);
                audio::apply_soundtrack(
                    tools,
                    loglevel,
                    &self.settings.mixing,
                    &targets.combined,
                    track,
                    mode,
                    &targets.output,
                )
                .await?;
                Ok(Some(mode))
            }
            None => {
                finalize::promote(&targets.combined, &targets.output)?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZeroBalance;
    use crate::tools::fake::FakeToolchain;
    use crate::tools::Tool;
    use std::fs;
    use std::path::Path;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    struct Fixture {
        work: tempfile::TempDir,
        base: tempfile::TempDir,
        tools: Arc<FakeToolchain>,
        settings: Settings,
    }

    impl Fixture {
        fn new(files: &[(&str, &str)], tools: FakeToolchain) -> Self {
            let work = tempfile::tempdir().unwrap();
            let base = tempfile::tempdir().unwrap();
            for (name, body) in files {
                fs::write(work.path().join(name), body).unwrap();
            }
            let mut settings = Settings::default();
            settings.general.temp_dir = base.path().to_string_lossy().to_string();
            Self {
                work,
                base,
                tools: Arc::new(tools),
                settings,
            }
        }

        fn request(&self) -> MontageRequest {
            MontageRequest {
                workdir: self.work.path().to_path_buf(),
                youtube: None,
                balance: None,
            }
        }

        async fn run(&self, request: MontageRequest) -> Result<MontageReport> {
            let pipeline = Pipeline::with_toolchain(self.settings.clone(), self.tools.clone());
            pipeline.run(&request).await
        }

        fn workdir(&self) -> PathBuf {
            self.work.path().canonicalize().unwrap()
        }

        fn mux_call(&self) -> String {
            self.tools
                .calls_for(Tool::Transcoder)
                .last()
                .unwrap()
                .joined()
        }
    }

    #[tokio::test]
    async fn test_clips_concatenated_in_name_order() {
        let fx = Fixture::new(
            &[("c.webm", "C"), ("a.mkv", "A"), ("B.MOV", "b"), ("notes.txt", "x")],
            FakeToolchain::new(),
        );

        let report = fx.run(fx.request()).await.unwrap();

        let names: Vec<String> = discovery::file_names(&report.clips);
        assert_eq!(names, vec!["B.MOV", "a.mkv", "c.webm"]);
        // One remux per clip plus one concat.
        assert_eq!(fx.tools.calls_for(Tool::Transcoder).len(), 4);
        assert_eq!(fs::read_to_string(&report.output).unwrap(), "bAC");
    }

    #[tokio::test]
    async fn test_no_audio_output_matches_combined_video() {
        let fx = Fixture::new(&[("a.mp4", "one"), ("b.mp4", "two")], FakeToolchain::new());

        let report = fx.run(fx.request()).await.unwrap();

        assert_eq!(report.output, fx.workdir().join("output.mp4"));
        assert_eq!(fs::read(&report.output).unwrap(), b"onetwo");
        assert!(report.soundtrack.is_none());
        assert!(report.mode.is_none());
        assert!(!fx.workdir().join("combined_video.mp4").exists());
    }

    #[tokio::test]
    async fn test_no_clips_is_no_input() {
        let fx = Fixture::new(&[("song.mp3", "s")], FakeToolchain::new());

        let err = fx.run(fx.request()).await.unwrap_err();

        assert!(matches!(err, ReelError::NoInput(_)));
        assert!(fx.tools.calls().is_empty());
        assert!(dir_entries(fx.base.path()).is_empty());
    }

    #[tokio::test]
    async fn test_scratch_removed_after_success() {
        let fx = Fixture::new(&[("a.mp4", "a"), ("song.mp3", "s")], FakeToolchain::new());

        let report = fx.run(fx.request()).await.unwrap();

        assert!(report.output.exists());
        assert!(dir_entries(fx.base.path()).is_empty());
        assert_eq!(dir_entries(&fx.workdir()), vec!["a.mp4", "output.mp4", "song.mp3"]);
    }

    #[tokio::test]
    async fn test_local_audio_replaces_without_balance() {
        let fx = Fixture::new(&[("a.mp4", "a"), ("song.mp3", "s")], FakeToolchain::new());

        let report = fx.run(fx.request()).await.unwrap();

        assert_eq!(report.mode, Some(MixMode::Replace));
        assert_eq!(
            report.soundtrack,
            Some(AudioTrack::Local(fx.workdir().join("song.mp3")))
        );
        let mux = fx.mux_call();
        assert!(mux.contains("-map 0:v:0 -map 1:a:0"));
        assert!(!mux.contains("amix"));
    }

    #[tokio::test]
    async fn test_half_balance_follows_montage_duration() {
        let fx = Fixture::new(&[("a.mp4", "a"), ("song.wav", "s")], FakeToolchain::new());
        let request = MontageRequest {
            balance: Some(Balance::new(0.5).unwrap()),
            ..fx.request()
        };

        fx.run(request).await.unwrap();

        let mux = fx.mux_call();
        assert!(mux.contains("[1:a]volume=0.5[a1]"));
        assert!(mux.contains("amix=inputs=2:duration=first:dropout_transition=2[aout]"));
        assert!(mux.contains("-map [aout]"));
    }

    #[tokio::test]
    async fn test_zero_balance_policies() {
        let zero = Some(Balance::new(0.0).unwrap());

        let fx = Fixture::new(&[("a.mp4", "a"), ("song.mp3", "s")], FakeToolchain::new());
        let report = fx
            .run(MontageRequest {
                balance: zero,
                ..fx.request()
            })
            .await
            .unwrap();
        assert!(matches!(report.mode, Some(MixMode::Mix(_))));
        assert!(fx.mux_call().contains("volume=0[a1]"));

        let mut fx = Fixture::new(&[("a.mp4", "a"), ("song.mp3", "s")], FakeToolchain::new());
        fx.settings.mixing.zero_balance = ZeroBalance::Replace;
        let report = fx
            .run(MontageRequest {
                balance: zero,
                ..fx.request()
            })
            .await
            .unwrap();
        assert_eq!(report.mode, Some(MixMode::Replace));
        assert!(!fx.mux_call().contains("amix"));
    }

    #[tokio::test]
    async fn test_remote_audio_wins_and_is_removed() {
        let fx = Fixture::new(
            &[("a.mp4", "a"), ("local.mp3", "l")],
            FakeToolchain::new().downloading(Some("m4a")),
        );
        let request = MontageRequest {
            youtube: Some(audio::parse_source_url("https://www.youtube.com/watch?v=x").unwrap()),
            ..fx.request()
        };

        let report = fx.run(request).await.unwrap();

        let Some(AudioTrack::Downloaded(downloaded)) = report.soundtrack.clone() else {
            panic!("expected a downloaded soundtrack, got {:?}", report.soundtrack);
        };
        assert!(downloaded.starts_with(fx.base.path().canonicalize().unwrap()));
        assert_eq!(downloaded.file_name().unwrap(), "downloaded_audio.m4a");
        assert_eq!(fx.tools.calls_for(Tool::Downloader).len(), 1);
        assert!(fx.mux_call().contains(&downloaded.display().to_string()));
        assert!(!downloaded.exists());
        assert!(dir_entries(fx.base.path()).is_empty());
        assert_eq!(dir_entries(&fx.workdir()), vec!["a.mp4", "local.mp3", "output.mp4"]);
    }

    #[tokio::test]
    async fn test_remote_run_keeps_clip_sharing_download_stem() {
        let fx = Fixture::new(
            &[("downloaded_audio.mkv", "clip")],
            FakeToolchain::new().downloading(Some("m4a")),
        );
        let request = MontageRequest {
            youtube: Some(audio::parse_source_url("https://www.youtube.com/watch?v=x").unwrap()),
            ..fx.request()
        };

        let report = fx.run(request).await.unwrap();

        assert_eq!(report.clips.len(), 1);
        assert_eq!(
            fs::read_to_string(fx.workdir().join("downloaded_audio.mkv")).unwrap(),
            "clip"
        );
        assert_eq!(
            dir_entries(&fx.workdir()),
            vec!["downloaded_audio.mkv", "output.mp4"]
        );
    }

    #[tokio::test]
    async fn test_failure_still_cleans_up() {
        let fx = Fixture::new(
            &[("a.mp4", "a"), ("b.mkv", "b"), ("song.mp3", "s")],
            FakeToolchain::new().failing_on("b.mkv"),
        );

        let err = fx.run(fx.request()).await.unwrap_err();

        assert!(matches!(err, ReelError::ToolFailed { .. }));
        assert!(dir_entries(fx.base.path()).is_empty());
        assert!(!fx.workdir().join("combined_video.mp4").exists());
        assert!(!fx.workdir().join("output.mp4").exists());
        assert!(fx.tools.spawned().is_empty());
    }

    #[tokio::test]
    async fn test_stale_output_replaced() {
        let fx = Fixture::new(
            &[("a.mp4", "fresh"), ("output.mp4", "stale"), ("combined_video.mp4", "old")],
            FakeToolchain::new(),
        );

        let report = fx.run(fx.request()).await.unwrap();

        assert_eq!(report.clips.len(), 1);
        assert_eq!(fs::read_to_string(&report.output).unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_output_outside_working_directory() {
        let mut fx = Fixture::new(&[("a.mp4", "one"), ("b.mp4", "two")], FakeToolchain::new());
        let elsewhere = tempfile::tempdir().unwrap();
        let target = elsewhere.path().join("trip.mp4");
        fx.settings.general.output_name = target.to_string_lossy().to_string();

        let report = fx.run(fx.request()).await.unwrap();

        assert_eq!(report.output, target);
        assert_eq!(fs::read(&target).unwrap(), b"onetwo");
        assert_eq!(dir_entries(&fx.workdir()), vec!["a.mp4", "b.mp4"]);
    }

    #[tokio::test]
    async fn test_player_handoff() {
        let fx = Fixture::new(&[("a.mp4", "a")], FakeToolchain::new().with_installed("vlc"));
        let report = fx.run(fx.request()).await.unwrap();
        assert!(matches!(report.playback, Playback::Launched { .. }));
        assert_eq!(fx.tools.spawned()[0].1, vec![report.output.display().to_string()]);

        let fx = Fixture::new(&[("a.mp4", "a")], FakeToolchain::new());
        let report = fx.run(fx.request()).await.unwrap();
        assert!(matches!(report.playback, Playback::NotInstalled { .. }));
    }

    #[tokio::test]
    async fn test_missing_workdir_is_invalid_input() {
        let fx = Fixture::new(&[], FakeToolchain::new());
        let request = MontageRequest {
            workdir: fx.work.path().join("nope"),
            ..fx.request()
        };
        let err = fx.run(request).await.unwrap_err();
        assert!(matches!(err, ReelError::InvalidInput(_)));
    }
}
