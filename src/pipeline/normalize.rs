//! Clip normalization.
//!
//! Remuxes every clip into the common container inside the scratch
//! directory. Runs through a bounded pool; results come back in clip order
//! regardless of completion order.

use crate::error::{ReelError, Result};
use crate::tools::{ffmpeg, Tool, Toolchain};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// A clip remuxed into the scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedClip {
    /// Position of the source clip in sorted order.
    pub index: usize,
    pub source: PathBuf,
    pub path: PathBuf,
}

/// Scratch file name for the clip at `index`: `<index>_<stem>.<container>`.
///
/// The index is zero-padded to at least three digits so the scratch
/// directory sorts the same way the clips do.
pub fn scratch_name(index: usize, total: usize, source: &Path, container: &str) -> String {
    let width = total.saturating_sub(1).to_string().len().max(3);
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string());
    format!("{:0width$}_{}.{}", index, stem, container, width = width)
}

/// Remux `clips` into `dir`, at most `max_concurrent` at a time.
///
/// The first failing remux aborts the batch.
#[instrument(skip(tools, clips), fields(clips = clips.len()))]
pub async fn normalize_clips(
    tools: &dyn Toolchain,
    loglevel: &str,
    clips: &[PathBuf],
    dir: &Path,
    container: &str,
    max_concurrent: usize,
) -> Result<Vec<NormalizedClip>> {
    let total = clips.len();
    info!("Remuxing {} clip(s) with up to {} job(s)", total, max_concurrent);

    let mut normalized: Vec<NormalizedClip> = stream::iter(clips.iter().enumerate())
        .map(|(index, source)| {
            let path = dir.join(scratch_name(index, total, source, container));
            async move {
                eprintln!("  Remuxing {} -> {}", source.display(), path.display());
                let args = ffmpeg::remux(loglevel, source, &path);
                tools.run(Tool::Transcoder, &args).await?;
                debug!("Remuxed clip {} into {}", index, path.display());
                Ok::<_, ReelError>(NormalizedClip {
                    index,
                    source: source.clone(),
                    path,
                })
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .try_collect()
        .await?;

    normalized.sort_by_key(|clip| clip.index);
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fake::FakeToolchain;
    use std::fs;

    #[test]
    fn test_scratch_name_padding() {
        assert_eq!(scratch_name(0, 3, Path::new("a.mkv"), "mp4"), "000_a.mp4");
        assert_eq!(scratch_name(7, 1200, Path::new("/x/trip.MOV"), "mp4"), "0007_trip.mp4");
        assert_eq!(scratch_name(2, 0, Path::new("b.webm"), "mkv"), "002_b.mkv");
    }

    #[test]
    fn test_scratch_names_unique_for_shared_stems() {
        let a = scratch_name(0, 2, Path::new("a.mkv"), "mp4");
        let b = scratch_name(1, 2, Path::new("a.mp4"), "mp4");
        assert_ne!(a, b);
    }

    fn setup_clips(names: &[&str]) -> (tempfile::TempDir, Vec<PathBuf>, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scratch");
        fs::create_dir(&out).unwrap();
        let clips = names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                fs::write(&path, name.as_bytes()).unwrap();
                path
            })
            .collect();
        (dir, clips, out)
    }

    #[tokio::test]
    async fn test_normalize_preserves_order_with_parallel_jobs() {
        let (_dir, clips, out) = setup_clips(&["a.mkv", "b.mp4", "c.mov", "d.webm", "e.avi"]);
        let tools = FakeToolchain::new();

        let normalized = normalize_clips(&tools, "warning", &clips, &out, "mp4", 3)
            .await
            .unwrap();

        assert_eq!(normalized.len(), 5);
        for (i, clip) in normalized.iter().enumerate() {
            assert_eq!(clip.index, i);
            assert_eq!(clip.source, clips[i]);
            assert!(clip.path.starts_with(&out));
            assert_eq!(fs::read(&clip.path).unwrap(), fs::read(&clips[i]).unwrap());
        }
        assert_eq!(tools.calls_for(Tool::Transcoder).len(), 5);
    }

    #[tokio::test]
    async fn test_normalize_failure_is_typed() {
        let (_dir, clips, out) = setup_clips(&["good.mp4", "broken.flv"]);
        let tools = FakeToolchain::new().failing_on("broken.flv");

        let err = normalize_clips(&tools, "warning", &clips, &out, "mp4", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::ToolFailed { ref tool, .. } if tool == "ffmpeg"));
    }

    #[tokio::test]
    async fn test_normalize_empty() {
        let (_dir, _clips, out) = setup_clips(&[]);
        let tools = FakeToolchain::new();
        let normalized = normalize_clips(&tools, "warning", &[], &out, "mp4", 1)
            .await
            .unwrap();
        assert!(normalized.is_empty());
        assert!(tools.calls().is_empty());
    }
}
