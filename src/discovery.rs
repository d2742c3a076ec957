//! Input discovery.
//!
//! Scans the top level of a working directory for video clips and audio
//! tracks. Results are sorted by file name, which is the only thing that
//! decides clip order in the montage.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions treated as video clips.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "flv", "wmv", "mov", "webm"];

/// Extensions treated as audio tracks.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Check if path has a video extension (case-insensitive).
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Check if path has an audio extension (case-insensitive).
pub fn is_audio_file(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

/// Regular files directly inside `dir` accepted by `filter`, sorted by file name.
fn scan(dir: &Path, filter: fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && filter(path))
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Find video clips in `dir`, sorted by file name.
pub fn find_clips(dir: &Path) -> Result<Vec<PathBuf>> {
    let clips = scan(dir, is_video_file)?;
    debug!("Found {} video clip(s) in {}", clips.len(), dir.display());
    Ok(clips)
}

/// Find audio tracks in `dir`, sorted by file name.
pub fn find_audio_tracks(dir: &Path) -> Result<Vec<PathBuf>> {
    let tracks = scan(dir, is_audio_file)?;
    debug!("Found {} audio track(s) in {}", tracks.len(), dir.display());
    Ok(tracks)
}

/// Display names of `paths`, for user-facing listings.
pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect()
}
