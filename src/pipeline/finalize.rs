//! Output materialization, cleanup and playback handoff.

use super::audio::AudioTrack;
use super::scratch::Scratch;
use crate::config::PlayerSettings;
use crate::error::Result;
use crate::tools::Toolchain;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info, warn};

/// Delete `path` if present. Returns whether a file was removed.
///
/// A missing file is not an error; any other failure is logged and ignored.
pub fn remove_if_exists(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}

/// Move the combined video into place as the output, untouched.
///
/// Falls back to copying when the output lives on another filesystem.
pub fn promote(combined: &Path, output: &Path) -> Result<()> {
    info!("No soundtrack, using {} as output", combined.display());
    match std::fs::rename(combined, output) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(e.into()),
        Err(e) => {
            debug!("Rename to {} failed ({}), copying instead", output.display(), e);
            copy_then_remove(combined, output)
        }
    }
}

/// Copy `from` to `to`, then delete `from`. A failed copy leaves `from` intact.
fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    if let Err(e) = std::fs::copy(from, to) {
        remove_if_exists(to);
        return Err(e.into());
    }
    std::fs::remove_file(from)?;
    Ok(())
}

/// Everything a run creates that must not outlive it.
pub struct Leftovers<'a> {
    pub scratch: Option<Scratch>,
    pub combined: &'a Path,
    pub soundtrack: Option<&'a AudioTrack>,
}

/// Remove the scratch directory, the combined video and a downloaded track.
///
/// Best-effort throughout; never fails the run.
pub fn cleanup(leftovers: Leftovers<'_>) {
    if let Some(scratch) = leftovers.scratch {
        let root = scratch.root().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch directory {}: {}", root.display(), e);
        }
    }

    remove_if_exists(leftovers.combined);

    if let Some(track) = leftovers.soundtrack {
        if track.is_owned() {
            remove_if_exists(track.path());
        }
    }
}

/// Outcome of handing the output to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playback {
    Launched { program: String },
    NotInstalled { program: String },
    Disabled,
    Failed(String),
}

/// Start the configured player on `output` without waiting for it.
pub fn hand_off(tools: &dyn Toolchain, settings: &PlayerSettings, output: &Path) -> Playback {
    if !settings.enabled {
        return Playback::Disabled;
    }

    let program = settings.program.clone();
    let Some(location) = tools.locate(&program) else {
        info!("{} not found on PATH", program);
        return Playback::NotInstalled { program };
    };

    match tools.spawn_detached(&location, &[OsString::from(output)]) {
        Ok(()) => {
            info!("Launched {} on {}", location.display(), output.display());
            Playback::Launched { program }
        }
        Err(e) => {
            warn!("Failed to launch {}: {}", program, e);
            Playback::Failed(e.to_string())
        }
    }
}
