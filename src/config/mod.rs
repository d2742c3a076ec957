//! Configuration module for Reel.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    DownloadSettings, GeneralSettings, MixingSettings, NormalizeSettings, PlayerSettings,
    Settings, ToolSettings, ZeroBalance,
};
