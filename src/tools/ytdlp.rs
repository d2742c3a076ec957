//! yt-dlp invocation and download bookkeeping.
//!
//! The downloader chooses the file extension itself, so the output is written
//! through a `<stem>.%(ext)s` template and located by stem afterwards.

use crate::error::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions of yt-dlp's in-progress and bookkeeping files.
const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl", "temp"];

/// Output template for a download named `stem` inside `dir`.
pub fn output_template(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.%(ext)s", stem))
}

/// Arguments downloading the `format` stream of `url` through `template`.
pub fn download_args(format: &str, template: &Path, url: &str) -> Vec<OsString> {
    vec![
        OsString::from("-f"),
        OsString::from(format),
        OsString::from("--no-playlist"),
        OsString::from("-o"),
        template.as_os_str().to_os_string(),
        OsString::from(url),
    ]
}

/// Files in `dir` named `<stem>.<anything>`, sorted by name.
///
/// Covers the finished download as well as yt-dlp's `<stem>.<ext>.part`
/// and `<stem>.<ext>.ytdl` bookkeeping files.
fn matching_files(dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}.", stem);
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn is_partial(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PARTIAL_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Locate the finished download for `stem` in `dir`.
pub fn find_download(dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    let found = matching_files(dir, stem)?
        .into_iter()
        .find(|path| !is_partial(path));
    debug!("Download lookup for {}: {:?}", stem, found);
    Ok(found)
}

/// Remove every file left over from an earlier download of `stem`.
///
/// Best-effort: failures are logged and skipped. Returns the number removed.
pub fn remove_downloads(dir: &Path, stem: &str) -> usize {
    let files = match matching_files(dir, stem) {
        Ok(files) => files,
        Err(e) => {
            warn!("Cannot scan {} for old downloads: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for file in files {
        match std::fs::remove_file(&file) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", file.display(), e),
        }
    }
    removed
}

/// Rename `download` to carry `extension`, returning the new path.
pub fn force_extension(download: &Path, extension: &str) -> Result<PathBuf> {
    let target = download.with_extension(extension);
    if target != download {
        std::fs::rename(download, &target)?;
    }
    Ok(target)
}
