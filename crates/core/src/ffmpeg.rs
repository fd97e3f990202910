//! FFmpeg/FFprobe shared command utilities.
//!
//! Every external media tool invocation in the workspace goes through this
//! module: [`probe_file`] for structured metadata, [`run_ffmpeg`] for
//! encodes and [`decode_pcm_mono`] for raw sample extraction.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;

use serde::Deserialize;
use tokio::process::Command;

/// FFmpeg binary name, resolved through `PATH`.
pub const FFMPEG_BIN: &str = "ffmpeg";

/// FFprobe binary name, resolved through `PATH`.
pub const FFPROBE_BIN: &str = "ffprobe";

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {output}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        /// Combined stdout + stderr of the failed invocation.
        output: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("audio file not found: {0}")]
    FileNotFound(String),

    #[error("ffmpeg timed out after {0} seconds")]
    TimedOut(u64),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    #[serde(default)]
    pub format: FfprobeFormat,
}

/// A single stream from ffprobe output.
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeStream {
    pub codec_name: Option<String>,
    pub codec_type: Option<String>,
    pub channels: Option<i32>,
    /// Reported as a string, e.g. `"44100"`.
    pub sample_rate: Option<String>,
    pub bits_per_sample: Option<i32>,
    /// Reported as a string, e.g. `"24"`.
    pub bits_per_raw_sample: Option<String>,
    pub duration: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
    /// Comma-separated list of demuxer names, e.g. `"mov,mp4,m4a"`.
    pub format_name: Option<String>,
    pub bit_rate: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a media file and return the parsed JSON output.
pub async fn probe_file(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    ensure_exists(path)?;

    let output = Command::new(FFPROBE_BIN)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(execution_failed(&output));
    }

    parse_probe_json(&output.stdout)
}

/// Parse raw ffprobe JSON bytes.
pub fn parse_probe_json(bytes: &[u8]) -> Result<FfprobeOutput, FfmpegError> {
    serde_json::from_slice::<FfprobeOutput>(bytes).map_err(|e| {
        FfmpegError::ParseError(format!("{e}: {}", String::from_utf8_lossy(bytes)))
    })
}

/// Run `ffmpeg` with the given arguments, failing on a non-zero exit.
///
/// The child is killed if the returned future is dropped, so callers may
/// wrap this in [`tokio::time::timeout`].
pub async fn run_ffmpeg<I, S>(args: I) -> Result<Output, FfmpegError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(FFMPEG_BIN)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(execution_failed(&output));
    }
    Ok(output)
}

/// Decode `path` to mono signed 16-bit little-endian PCM at `sample_rate`.
pub async fn decode_pcm_mono(path: &Path, sample_rate: u32) -> Result<Vec<i16>, FfmpegError> {
    ensure_exists(path)?;

    let rate = sample_rate.to_string();
    let output = run_ffmpeg([
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-i"),
        path.as_os_str(),
        OsStr::new("-ac"),
        OsStr::new("1"),
        OsStr::new("-ar"),
        OsStr::new(&rate),
        OsStr::new("-f"),
        OsStr::new("s16le"),
        OsStr::new("-"),
    ])
    .await?;
    Ok(samples_from_s16le(&output.stdout))
}

/// Reinterpret little-endian byte pairs as `i16` samples. A trailing odd
/// byte is ignored.
pub fn samples_from_s16le(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ensure_exists(path: &Path) -> Result<(), FfmpegError> {
    if path.exists() {
        Ok(())
    } else {
        Err(FfmpegError::FileNotFound(path.to_string_lossy().to_string()))
    }
}

fn execution_failed(output: &Output) -> FfmpegError {
    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    FfmpegError::ExecutionFailed {
        exit_code: output.status.code(),
        output: combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s16le_decoding_is_little_endian() {
        let bytes = [0x01, 0x00, 0xff, 0x7f, 0x00, 0x80, 0xff, 0xff];
        assert_eq!(samples_from_s16le(&bytes), vec![1, i16::MAX, i16::MIN, -1]);
    }

    #[test]
    fn s16le_ignores_trailing_byte() {
        assert_eq!(samples_from_s16le(&[0x02, 0x00, 0x09]), vec![2]);
    }

    #[test]
    fn probe_json_tolerates_missing_sections() {
        let probe = parse_probe_json(br#"{}"#).unwrap();
        assert!(probe.streams.is_empty());
        assert!(probe.format.duration.is_none());
    }

    #[test]
    fn probe_json_rejects_garbage() {
        let err = parse_probe_json(b"not json").unwrap_err();
        assert!(matches!(err, FfmpegError::ParseError(_)));
    }

    #[tokio::test]
    async fn probe_missing_file_is_reported() {
        let err = probe_file(Path::new("/nonexistent/vault/source.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, FfmpegError::FileNotFound(_)));
    }
}
