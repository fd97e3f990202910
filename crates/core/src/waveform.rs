//! Waveform extraction for the track player.
//!
//! The source is decoded to 8 kHz mono PCM, split into `num_bars` buckets
//! and each bucket's RMS is mapped onto a log-compressed height in
//! `MIN_HEIGHT..=MAX_HEIGHT`. Heights are normalised against a fixed
//! reference level rather than the track's own peak, so quiet tracks stay
//! visibly quieter than loud ones.

use std::path::Path;

use crate::ffmpeg::{self, FfmpegError};
use crate::probe;

/// Bars produced when the caller asks for zero.
pub const DEFAULT_BARS: usize = 200;

/// Decode rate used for waveform analysis.
pub const WAVEFORM_SAMPLE_RATE: u32 = 8_000;

pub const MIN_HEIGHT: i32 = 5;
pub const MAX_HEIGHT: i32 = 80;

/// 70% of 16-bit full scale.
const REFERENCE_LEVEL: f64 = 32_768.0 * 0.7;

#[derive(Debug, thiserror::Error)]
pub enum WaveformError {
    #[error("invalid duration: {0}")]
    InvalidDuration(f64),

    #[error("failed to extract metadata: {0}")]
    Probe(#[source] FfmpegError),

    #[error("failed to extract PCM data: {0}")]
    Decode(#[source] FfmpegError),

    #[error("waveform task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Generate a waveform of `num_bars` heights for the audio file at `path`.
pub async fn generate_waveform(path: &Path, num_bars: usize) -> Result<Vec<i32>, WaveformError> {
    let metadata = probe::probe_audio(path)
        .await
        .map_err(WaveformError::Probe)?;
    if metadata.duration <= 0.0 || metadata.duration.is_nan() {
        return Err(WaveformError::InvalidDuration(metadata.duration));
    }

    let samples = ffmpeg::decode_pcm_mono(path, WAVEFORM_SAMPLE_RATE)
        .await
        .map_err(WaveformError::Decode)?;

    // Long sources decode to millions of samples.
    let waveform =
        tokio::task::spawn_blocking(move || compute_waveform(&samples, num_bars)).await?;
    Ok(waveform)
}

/// Bucket `samples` into `num_bars` heights.
///
/// Buckets hold `ceil(len / num_bars)` samples each, so the last one may
/// be short. Buckets past the end of a very short input render at
/// [`MIN_HEIGHT`].
pub fn compute_waveform(samples: &[i16], num_bars: usize) -> Vec<i32> {
    let num_bars = if num_bars == 0 { DEFAULT_BARS } else { num_bars };
    let per_bar = samples.len().div_ceil(num_bars).max(1);

    (0..num_bars)
        .map(|i| {
            let start = i * per_bar;
            if start >= samples.len() {
                return MIN_HEIGHT;
            }
            let end = (start + per_bar).min(samples.len());
            bar_height(rms(&samples[start..end]))
        })
        .collect()
}

/// Map a bucket RMS onto a display height.
pub fn bar_height(rms: f64) -> i32 {
    let ratio = (rms / REFERENCE_LEVEL).clamp(0.0, 1.0);
    let scaled = (1.0 + 9.0 * ratio).log10();
    let height = MIN_HEIGHT as f64 + scaled * (MAX_HEIGHT - MIN_HEIGHT) as f64;
    (height as i32).clamp(MIN_HEIGHT, MAX_HEIGHT)
}

fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum / samples.len() as f64).sqrt()
}

/// Serialise heights as a compact JSON array, e.g. `[5,12,80]`.
pub fn waveform_to_json(waveform: &[i32]) -> Result<String, serde_json::Error> {
    serde_json::to_string(waveform)
}

pub fn waveform_from_json(json: &str) -> Result<Vec<i32>, serde_json::Error> {
    serde_json::from_str(json)
}
