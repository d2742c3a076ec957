//! Concatenation through ffmpeg's concat demuxer.

use super::normalize::NormalizedClip;
use crate::error::Result;
use crate::tools::{ffmpeg, Tool, Toolchain};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, instrument};

/// One manifest line for `path`.
///
/// Single quotes cannot appear inside a quoted concat entry, so each one
/// closes the quote, emits an escaped quote and reopens it.
pub fn manifest_line(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', "'\\''");
    format!("file '{}'", escaped)
}

/// Manifest text listing `clips` in clip order.
pub fn render_manifest(clips: &[NormalizedClip]) -> String {
    let mut ordered: Vec<&NormalizedClip> = clips.iter().collect();
    ordered.sort_by_key(|clip| clip.index);

    ordered
        .iter()
        .map(|clip| format!("{}\n", manifest_line(&clip.path)))
        .collect()
}

/// Write the manifest for `clips` to `path`.
pub fn write_manifest(path: &Path, clips: &[NormalizedClip]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(render_manifest(clips).as_bytes())?;
    file.flush()?;
    debug!("Wrote manifest with {} entries to {}", clips.len(), path.display());
    Ok(())
}

/// Join the files listed in `manifest` into `output` without re-encoding.
#[instrument(skip(tools))]
pub async fn concatenate(
    tools: &dyn Toolchain,
    loglevel: &str,
    manifest: &Path,
    output: &Path,
) -> Result<()> {
    info!("Combining clips into {}", output.display());
    let args = ffmpeg::concat(loglevel, manifest, output);
    tools.run(Tool::Transcoder, &args).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fake::{parse_manifest_line, FakeToolchain};
    use std::path::PathBuf;

    fn clip(index: usize, path: &str) -> NormalizedClip {
        NormalizedClip {
            index,
            source: PathBuf::from(format!("src{index}")),
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_manifest_line_quotes_path() {
        assert_eq!(
            manifest_line(Path::new("/tmp/reel-x/clips/000_a.mp4")),
            "file '/tmp/reel-x/clips/000_a.mp4'"
        );
    }

    #[test]
    fn test_manifest_line_escapes_single_quotes() {
        let line = manifest_line(Path::new("/tmp/it's here.mp4"));
        assert_eq!(line, r"file '/tmp/it'\''s here.mp4'");
        assert_eq!(parse_manifest_line(&line), PathBuf::from("/tmp/it's here.mp4"));
    }

    #[test]
    fn test_render_manifest_orders_by_index() {
        let clips = vec![clip(2, "/s/002_c.mp4"), clip(0, "/s/000_a.mp4"), clip(1, "/s/001_b.mp4")];
        assert_eq!(
            render_manifest(&clips),
            "file '/s/000_a.mp4'\nfile '/s/001_b.mp4'\nfile '/s/002_c.mp4'\n"
        );
    }

    #[test]
    fn test_render_manifest_empty() {
        assert_eq!(render_manifest(&[]), "");
    }

    #[tokio::test]
    async fn test_concatenate_joins_in_manifest_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut clips = Vec::new();
        for (i, body) in ["one", "two", "three"].iter().enumerate() {
            let path = dir.path().join(format!("{i:03}_{body}.mp4"));
            std::fs::write(&path, body).unwrap();
            clips.push(NormalizedClip {
                index: i,
                source: PathBuf::from(body),
                path,
            });
        }

        let manifest = dir.path().join("concat.txt");
        write_manifest(&manifest, &clips).unwrap();
        let output = dir.path().join("combined.mp4");

        let tools = FakeToolchain::new();
        concatenate(&tools, "warning", &manifest, &output).await.unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "onetwothree");
        let calls = tools.calls_for(Tool::Transcoder);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].joined().contains("-f concat -safe 0"));
    }
}
