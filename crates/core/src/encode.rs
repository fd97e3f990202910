//! Format transcoder: fixed-profile encodes through ffmpeg.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::ffmpeg::{self, FfmpegError};

/// Output sample rate of the lossy copy.
pub const LOSSY_SAMPLE_RATE: &str = "44100";

/// Output channel count of the lossy copy.
pub const LOSSY_CHANNELS: &str = "2";

/// Output bitrate of the lossy copy.
pub const LOSSY_BITRATE_ARG: &str = "320k";

/// Encode `input` to a 320 kbit/s, 44.1 kHz stereo MP3 at `output`.
///
/// Missing parent directories of `output` are created. On failure the
/// error carries ffmpeg's combined output; a partial file may remain at
/// `output`.
pub async fn transcode_to_mp3(input: &Path, output: &Path) -> Result<(), FfmpegError> {
    if let Some(dir) = output.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    ffmpeg::run_ffmpeg([
        OsStr::new("-i"),
        input.as_os_str(),
        OsStr::new("-vn"),
        OsStr::new("-ar"),
        OsStr::new(LOSSY_SAMPLE_RATE),
        OsStr::new("-ac"),
        OsStr::new(LOSSY_CHANNELS),
        OsStr::new("-b:a"),
        OsStr::new(LOSSY_BITRATE_ARG),
        OsStr::new("-y"),
        output.as_os_str(),
    ])
    .await?;

    tracing::debug!(input = %input.display(), output = %output.display(), "Transcoded to MP3");
    Ok(())
}

/// Extract the audio of a video upload into a 24-bit PCM WAV beside it.
///
/// The original video is removed once the WAV is written. Returns the WAV
/// path.
pub async fn extract_audio_to_wav(input: &Path) -> Result<PathBuf, FfmpegError> {
    let output = input.with_extension("wav");

    ffmpeg::run_ffmpeg([
        OsStr::new("-i"),
        input.as_os_str(),
        OsStr::new("-vn"),
        OsStr::new("-acodec"),
        OsStr::new("pcm_s24le"),
        OsStr::new("-y"),
        output.as_os_str(),
    ])
    .await?;

    tokio::fs::remove_file(input).await?;
    Ok(output)
}
