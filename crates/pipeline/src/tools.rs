//! External media tool seam.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use vault_core::encode;
use vault_core::ffmpeg::FfmpegError;
use vault_core::waveform::{self, WaveformError};

/// The two media operations a transcode job performs.
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Encode `source` to the lossy profile at `output`.
    async fn transcode(&self, source: &Path, output: &Path) -> Result<(), FfmpegError>;

    /// Compute `bars` waveform heights for `source`.
    async fn waveform(&self, source: &Path, bars: usize) -> Result<Vec<i32>, WaveformError>;
}

/// [`MediaTools`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTools {
    encode_timeout: Option<Duration>,
}

impl FfmpegTools {
    /// `encode_timeout` bounds each encode; the encoder is killed on expiry.
    pub fn new(encode_timeout: Option<Duration>) -> Self {
        Self { encode_timeout }
    }
}

#[async_trait]
impl MediaTools for FfmpegTools {
    async fn transcode(&self, source: &Path, output: &Path) -> Result<(), FfmpegError> {
        let encode = encode::transcode_to_mp3(source, output);
        match self.encode_timeout {
            // Dropping the encode future kills the child process.
            Some(limit) => tokio::time::timeout(limit, encode)
                .await
                .map_err(|_| FfmpegError::TimedOut(limit.as_secs()))?,
            None => encode.await,
        }
    }

    async fn waveform(&self, source: &Path, bars: usize) -> Result<Vec<i32>, WaveformError> {
        waveform::generate_waveform(source, bars).await
    }
}
