//! Audio probe: structured metadata for an uploaded audio file.
//!
//! Wraps [`crate::ffmpeg::probe_file`] and folds the raw ffprobe output into
//! an [`AudioMetadata`]. Individual fields that are missing or unparseable
//! degrade to zero values; only a failed invocation or unreadable JSON is an
//! error.

use std::path::Path;

use serde::Serialize;

use crate::ffmpeg::{self, FfmpegError, FfprobeOutput};

/// Codecs treated as lossless.
const LOSSLESS_CODECS: &[&str] = &[
    "flac",
    "alac",
    "ape",
    "wavpack",
    "tta",
    "pcm_s16le",
    "pcm_s24le",
    "pcm_s32le",
    "pcm_s16be",
    "pcm_s24be",
    "pcm_s32be",
    "pcm_f32le",
    "pcm_f64le",
];

/// Extensions accepted as audio uploads.
const AUDIO_EXTENSIONS: &[&str] = &[
    "wav", "flac", "mp3", "aac", "ogg", "aiff", "aif", "alac", "m4a", "wma", "opus", "webm",
];

/// Extensions accepted as video uploads (audio is extracted on ingest).
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];

/// Metadata extracted from the first audio stream of a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioMetadata {
    /// Seconds.
    pub duration: f64,
    /// Hz.
    pub sample_rate: u32,
    pub bit_depth: u32,
    pub channels: u32,
    /// Bits per second.
    pub bitrate: u64,
    /// Container format, e.g. `"wav"`.
    pub format: String,
    /// Codec name, e.g. `"pcm_s24le"`.
    pub codec: String,
    pub is_lossless: bool,
}

impl AudioMetadata {
    /// Fold raw ffprobe output into metadata.
    pub fn from_probe(probe: &FfprobeOutput) -> Self {
        let mut metadata = AudioMetadata {
            duration: parse_or_zero(probe.format.duration.as_deref()),
            format: probe
                .format
                .format_name
                .as_deref()
                .and_then(|names| names.split(',').next())
                .unwrap_or_default()
                .to_string(),
            bitrate: parse_or_zero(probe.format.bit_rate.as_deref()),
            ..Default::default()
        };

        let audio = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"));

        if let Some(stream) = audio {
            metadata.codec = stream.codec_name.clone().unwrap_or_default();
            metadata.channels = stream.channels.unwrap_or(0).max(0) as u32;
            metadata.sample_rate = parse_or_zero(stream.sample_rate.as_deref());
            metadata.bit_depth = match stream.bits_per_sample {
                Some(bits) if bits > 0 => bits as u32,
                _ => parse_or_zero(stream.bits_per_raw_sample.as_deref()),
            };
            metadata.is_lossless = is_lossless_codec(&metadata.codec);
        }

        metadata
    }
}

/// Probe `path` with ffprobe and return its audio metadata.
pub async fn probe_audio(path: &Path) -> Result<AudioMetadata, FfmpegError> {
    let probe = ffmpeg::probe_file(path).await?;
    Ok(AudioMetadata::from_probe(&probe))
}

/// Whether `codec` is one of the known lossless codecs.
pub fn is_lossless_codec(codec: &str) -> bool {
    LOSSLESS_CODECS.contains(&codec)
}

fn parse_or_zero<T: std::str::FromStr + Default>(value: Option<&str>) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Upload format checks
// ---------------------------------------------------------------------------

/// Whether an upload with extension `ext` (with or without the leading dot)
/// is accepted.
pub fn is_allowed_upload_extension(ext: &str) -> bool {
    let ext = normalize_extension(ext);
    AUDIO_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// Whether `ext` names a video container whose audio must be extracted.
pub fn is_video_extension(ext: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&normalize_extension(ext).as_str())
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// `44100 -> "44.1 kHz"`, `48000 -> "48 kHz"`, `0 -> ""`.
pub fn format_sample_rate(hz: u32) -> String {
    if hz == 0 {
        return String::new();
    }
    if hz % 1000 == 0 {
        format!("{} kHz", hz / 1000)
    } else {
        format!("{:.1} kHz", hz as f64 / 1000.0)
    }
}

/// `24 -> "24-bit"`, `0 -> ""`.
pub fn format_bit_depth(bits: u32) -> String {
    if bits == 0 {
        String::new()
    } else {
        format!("{bits}-bit")
    }
}

/// Human-readable size in binary units, e.g. `"1.5 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = "KMGTPE".as_bytes()[exp] as char;
    format!("{:.1} {prefix}B", bytes as f64 / div as f64)
}
