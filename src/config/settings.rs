//! Configuration settings for Reel.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub tools: ToolSettings,
    pub normalize: NormalizeSettings,
    pub mixing: MixingSettings,
    pub download: DownloadSettings,
    pub player: PlayerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralSettings {
    /// Base directory for scratch files. Empty means the system temp area.
    pub temp_dir: String,
    /// File name of the finished montage, relative to the working directory.
    pub output_name: String,
    /// Name of the intermediate concatenated video.
    pub combined_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: String::new(),
            output_name: "output.mp4".to_string(),
            combined_name: "combined_video.mp4".to_string(),
        }
    }
}

/// External tool locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolSettings {
    /// Transcoder executable.
    pub ffmpeg: String,
    /// Downloader executable.
    pub ytdlp: String,
    /// Value passed to ffmpeg's `-loglevel`.
    pub loglevel: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ytdlp: "yt-dlp".to_string(),
            loglevel: "warning".to_string(),
        }
    }
}

/// Clip normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizeSettings {
    /// Common container extension every clip is remuxed into.
    pub container: String,
    /// Maximum concurrent remux processes.
    pub max_concurrent: usize,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            container: "mp4".to_string(),
            max_concurrent: 1,
        }
    }
}

/// How an explicit balance of exactly 0.0 is interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ZeroBalance {
    /// Mix the soundtrack in at zero volume.
    #[default]
    Mix,
    /// Behave as if no balance was given and replace the montage audio.
    Replace,
}

impl std::str::FromStr for ZeroBalance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mix" => Ok(ZeroBalance::Mix),
            "replace" => Ok(ZeroBalance::Replace),
            _ => Err(format!("Unknown zero balance policy: {}", s)),
        }
    }
}

impl std::fmt::Display for ZeroBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZeroBalance::Mix => write!(f, "mix"),
            ZeroBalance::Replace => write!(f, "replace"),
        }
    }
}

/// Audio replacement and mixing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixingSettings {
    /// Balance used when `--balance` is given without a value.
    pub default_balance: f64,
    /// Interpretation of an explicit 0.0 balance.
    pub zero_balance: ZeroBalance,
    /// Encoder for the output audio stream.
    pub audio_codec: String,
    /// Seconds of `amix` dropout transition.
    pub dropout_transition: u32,
}

impl Default for MixingSettings {
    fn default() -> Self {
        Self {
            default_balance: 0.2,
            zero_balance: ZeroBalance::Mix,
            audio_codec: "aac".to_string(),
            dropout_transition: 2,
        }
    }
}

/// Remote audio download settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadSettings {
    /// File stem of the downloaded track in the working directory.
    pub stem: String,
    /// yt-dlp format selector.
    pub format: String,
    /// Rename the download to this extension before use.
    pub rename_extension: Option<String>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            stem: "downloaded_audio".to_string(),
            format: "bestaudio".to_string(),
            rename_extension: None,
        }
    }
}

/// Playback handoff settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerSettings {
    /// Player executable looked up on PATH.
    pub program: String,
    /// Launch the player after a successful run.
    pub enabled: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            program: "vlc".to_string(),
            enabled: true,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ReelError;

        if !(0.0..=1.0).contains(&self.mixing.default_balance) {
            return Err(ReelError::Config(format!(
                "mixing.default_balance must be between 0.0 and 1.0, got {}",
                self.mixing.default_balance
            )));
        }
        if self.normalize.max_concurrent == 0 {
            return Err(ReelError::Config(
                "normalize.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.general.output_name.is_empty() || self.general.combined_name.is_empty() {
            return Err(ReelError::Config(
                "general.output_name and general.combined_name must not be empty".to_string(),
            ));
        }
        if self.general.output_name == self.general.combined_name {
            return Err(ReelError::Config(
                "general.output_name and general.combined_name must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reel")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Base directory for scratch directories.
    pub fn temp_dir(&self) -> PathBuf {
        if self.general.temp_dir.trim().is_empty() {
            std::env::temp_dir()
        } else {
            Self::expand_path(&self.general.temp_dir)
        }
    }
}
