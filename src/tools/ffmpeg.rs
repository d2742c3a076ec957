//! ffmpeg argument construction.
//!
//! Builders for the four transcoder invocations the pipeline makes: remux a
//! clip, concatenate a manifest, replace the montage audio, and mix a
//! soundtrack into it. Every command overwrites its output (`-y`) because the
//! pipeline owns those paths.

use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Incremental ffmpeg argument list.
#[derive(Debug, Clone)]
pub struct FfmpegArgs {
    args: Vec<OsString>,
}

impl FfmpegArgs {
    /// Start an argument list with the common quiet, non-interactive prelude.
    pub fn new(loglevel: &str) -> Self {
        Self { args: Vec::new() }.args(["-hide_banner", "-nostdin", "-loglevel", loglevel, "-y"])
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Add an input file.
    pub fn input(self, path: &Path) -> Self {
        self.arg("-i").arg(path)
    }

    /// Finish with the output file.
    pub fn output(self, path: &Path) -> Vec<OsString> {
        self.arg(path).args
    }
}

/// Stream-copy `input` into `output`, letting the output extension pick the container.
pub fn remux(loglevel: &str, input: &Path, output: &Path) -> Vec<OsString> {
    FfmpegArgs::new(loglevel)
        .input(input)
        .args(["-c:v", "copy", "-c:a", "copy"])
        .output(output)
}

/// Losslessly join the files listed in a concat demuxer `manifest`.
pub fn concat(loglevel: &str, manifest: &Path, output: &Path) -> Vec<OsString> {
    FfmpegArgs::new(loglevel)
        .args(["-f", "concat", "-safe", "0"])
        .input(manifest)
        .args(["-c", "copy"])
        .output(output)
}

/// Replace the audio of `video` with `audio`, stopping at the shorter stream.
pub fn replace_audio(
    loglevel: &str,
    video: &Path,
    audio: &Path,
    audio_codec: &str,
    output: &Path,
) -> Vec<OsString> {
    FfmpegArgs::new(loglevel)
        .input(video)
        .input(audio)
        .args(["-c:v", "copy", "-c:a", audio_codec])
        .args(["-map", "0:v:0", "-map", "1:a:0"])
        .args(["-shortest", "-fflags", "+genpts"])
        .output(output)
}

/// `filter_complex` graph scaling the soundtrack by `balance` and mixing it
/// under the montage audio. Output length follows the first input.
pub fn mix_filter(balance: f64, dropout_transition: u32) -> String {
    format!(
        "[1:a]volume={balance}[a1];[0:a][a1]amix=inputs=2:duration=first:dropout_transition={dropout_transition}[aout]"
    )
}

/// Mix `audio` into the audio of `video` at `balance`.
pub fn mix_audio(
    loglevel: &str,
    video: &Path,
    audio: &Path,
    balance: f64,
    dropout_transition: u32,
    audio_codec: &str,
    output: &Path,
) -> Vec<OsString> {
    FfmpegArgs::new(loglevel)
        .input(video)
        .input(audio)
        .arg("-filter_complex")
        .arg(mix_filter(balance, dropout_transition))
        .args(["-map", "0:v:0", "-map", "[aout]"])
        .args(["-c:v", "copy", "-c:a", audio_codec])
        .args(["-shortest", "-fflags", "+genpts"])
        .output(output)
}
