//! Transcoding status lifecycle and the notification sink capability.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// File name of the lossy copy, written next to the source file.
pub const LOSSY_FILE_NAME: &str = "lossy.mp3";

/// Container format recorded on lossy track files.
pub const LOSSY_FORMAT: &str = "mp3";

/// Bitrate (bits/sec) of the lossy copy.
pub const LOSSY_BITRATE: i64 = 320_000;

/// Status of a track file's encode.
///
/// A lossy file moves `Pending -> Processing -> Completed | Failed`. Source
/// files carry no status at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscodingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TranscodingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscodingStatus::Pending => "pending",
            TranscodingStatus::Processing => "processing",
            TranscodingStatus::Completed => "completed",
            TranscodingStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TranscodingStatus::Pending),
            "processing" => Some(TranscodingStatus::Processing),
            "completed" => Some(TranscodingStatus::Completed),
            "failed" => Some(TranscodingStatus::Failed),
            _ => None,
        }
    }

    /// `true` once the status can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, TranscodingStatus::Completed | TranscodingStatus::Failed)
    }
}

impl std::fmt::Display for TranscodingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of transcoding progress updates.
///
/// Called concurrently from every worker. Implementations must not block
/// and must not assume any ordering between different jobs.
pub trait TranscodingNotifier: Send + Sync {
    fn notify_transcoding_update(
        &self,
        user_id: DbId,
        track_public_id: &str,
        version_id: DbId,
        status: TranscodingStatus,
    );
}

/// Notifier that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl TranscodingNotifier for NoopNotifier {
    fn notify_transcoding_update(&self, _: DbId, _: &str, _: DbId, _: TranscodingStatus) {}
}

/// Where the lossy copy of `source_path` is written.
pub fn lossy_output_path(source_path: &Path) -> PathBuf {
    source_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(LOSSY_FILE_NAME)
}
