//! Soundtrack acquisition and mixing.
//!
//! A soundtrack comes from a remote URL (downloaded, owned by the run) or
//! from the first local audio file (borrowed, never deleted). It then either
//! replaces the montage audio or is mixed under it at a balance.

use crate::config::{DownloadSettings, MixingSettings, ZeroBalance};
use crate::discovery;
use crate::error::{ReelError, Result};
use crate::tools::{ffmpeg, ytdlp, Tool, Toolchain};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use url::Url;

/// Soundtrack volume relative to the montage audio, within 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Balance(f64);

impl Balance {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ReelError::InvalidInput(format!(
                "Invalid balance value: {}. It should be a number between 0.0 and 1.0.",
                value
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl std::str::FromStr for Balance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", s))?;
        Balance::new(value).map_err(|e| e.to_string())
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the soundtrack is combined with the montage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixMode {
    /// Drop the montage audio and use the soundtrack alone.
    Replace,
    /// Mix the soundtrack, scaled by the balance, under the montage audio.
    Mix(Balance),
}

impl MixMode {
    /// Pick the mode for an optional balance under the zero-balance policy.
    pub fn resolve(balance: Option<Balance>, zero: ZeroBalance) -> Self {
        match balance {
            None => MixMode::Replace,
            Some(b) if b.is_zero() && zero == ZeroBalance::Replace => MixMode::Replace,
            Some(b) => MixMode::Mix(b),
        }
    }
}

/// The audio track chosen for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioTrack {
    /// Fetched for this run; deleted at cleanup.
    Downloaded(PathBuf),
    /// Pre-existing file in the working directory; left alone.
    Local(PathBuf),
}

impl AudioTrack {
    pub fn path(&self) -> &Path {
        match self {
            AudioTrack::Downloaded(path) | AudioTrack::Local(path) => path,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, AudioTrack::Downloaded(_))
    }
}

/// Parse a remote audio source, accepting only absolute http(s) URLs.
pub fn parse_source_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())
        .map_err(|e| ReelError::InvalidInput(format!("Invalid URL '{}': {}", input, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ReelError::InvalidInput(format!(
            "Unsupported URL scheme '{}' in {}",
            other, input
        ))),
    }
}

/// Download the best audio stream of `url` into `dir`.
///
/// `dir` must be owned by the caller: earlier files named after the
/// download stem are removed first.
#[instrument(skip(tools, settings), fields(url = %url))]
pub async fn download(
    tools: &dyn Toolchain,
    settings: &DownloadSettings,
    url: &Url,
    dir: &Path,
) -> Result<AudioTrack> {
    let stale = ytdlp::remove_downloads(dir, &settings.stem);
    if stale > 0 {
        info!("Removed {} stale download file(s)", stale);
    }

    info!("Downloading audio from {}", url);
    eprintln!("  Downloading audio...");
    let template = ytdlp::output_template(dir, &settings.stem);
    let args = ytdlp::download_args(&settings.format, &template, url.as_str());
    tools.run(Tool::Downloader, &args).await?;

    let downloaded = ytdlp::find_download(dir, &settings.stem)?.ok_or_else(|| {
        ReelError::NoInput(format!("downloader produced no file for {}", url))
    })?;

    let path = match settings.rename_extension.as_deref() {
        Some(ext) if !ext.is_empty() => ytdlp::force_extension(&downloaded, ext)?,
        _ => downloaded,
    };
    eprintln!("  Audio downloaded: {}", path.display());
    Ok(AudioTrack::Downloaded(path))
}

/// Choose the soundtrack: remote when a URL is given, downloaded into
/// `download_dir`; otherwise the first audio file in `workdir`.
pub async fn acquire(
    tools: &dyn Toolchain,
    settings: &DownloadSettings,
    url: Option<&Url>,
    workdir: &Path,
    download_dir: &Path,
) -> Result<Option<AudioTrack>> {
    if let Some(url) = url {
        return download(tools, settings, url, download_dir).await.map(Some);
    }

    let tracks = discovery::find_audio_tracks(workdir)?;
    match tracks.into_iter().next() {
        Some(track) => {
            info!("Using local audio file {}", track.display());
            Ok(Some(AudioTrack::Local(track)))
        }
        None => {
            info!("No audio files found in {}", workdir.display());
            Ok(None)
        }
    }
}

/// Put `track` onto `combined` according to `mode`, writing `output`.
#[instrument(skip(tools, settings))]
pub async fn apply_soundtrack(
    tools: &dyn Toolchain,
    loglevel: &str,
    settings: &MixingSettings,
    combined: &Path,
    track: &AudioTrack,
    mode: MixMode,
    output: &Path,
) -> Result<()> {
    let args = match mode {
        MixMode::Replace => {
            eprintln!("  Replacing montage audio with {}", track.path().display());
            ffmpeg::replace_audio(loglevel, combined, track.path(), &settings.audio_codec, output)
        }
        MixMode::Mix(balance) => {
            eprintln!(
                "  Mixing {} into montage audio at {}",
                track.path().display(),
                balance
            );
            ffmpeg::mix_audio(
                loglevel,
                combined,
                track.path(),
                balance.value(),
                settings.dropout_transition,
                &settings.audio_codec,
                output,
            )
        }
    };

    tools.run(Tool::Transcoder, &args).await?;
    Ok(())
}
