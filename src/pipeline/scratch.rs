//! Scratch workspace for one pipeline run.
//!
//! Holds the normalized clips, the concat manifest and any downloaded
//! soundtrack. Removed explicitly at
//! cleanup; if a run bails out before that, dropping it removes it too.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::debug;

const CLIPS_DIR: &str = "clips";
const AUDIO_DIR: &str = "audio";
const MANIFEST_NAME: &str = "concat.txt";

pub struct Scratch {
    dir: TempDir,
    root: PathBuf,
}

impl Scratch {
    /// Create a fresh `reel-*` directory under `base`.
    pub fn create(base: &Path) -> Result<Self> {
        std::fs::create_dir_all(base)?;
        let dir = Builder::new().prefix("reel-").tempdir_in(base)?;

        // Manifest entries must be absolute: the concat demuxer resolves
        // relative entries against the manifest's own directory.
        let root = dir.path().canonicalize()?;
        std::fs::create_dir(root.join(CLIPS_DIR))?;
        std::fs::create_dir(root.join(AUDIO_DIR))?;

        debug!("Scratch directory created: {}", root.display());
        Ok(Self { dir, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory receiving one normalized file per clip.
    pub fn clips_dir(&self) -> PathBuf {
        self.root.join(CLIPS_DIR)
    }

    /// Directory receiving a downloaded soundtrack.
    pub fn audio_dir(&self) -> PathBuf {
        self.root.join(AUDIO_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_NAME)
    }

    /// Delete the directory and everything in it.
    pub fn close(self) -> Result<()> {
        debug!("Removing scratch directory {}", self.root.display());
        self.dir.close()?;
        Ok(())
    }
}
