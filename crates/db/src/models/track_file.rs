//! Track file entity model and DTOs.
//!
//! A track file is one physical encode of a version at one quality tier.
//! At most one exists per `(version_id, quality)`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vault_core::quality::Quality;
use vault_core::transcoding::TranscodingStatus;
use vault_core::types::{DbId, Timestamp};

/// A row from the `track_files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrackFile {
    pub id: DbId,
    pub version_id: DbId,
    pub quality: String,
    pub file_path: String,
    pub file_size: i64,
    pub format: String,
    pub bitrate: Option<i64>,
    pub content_hash: Option<String>,
    /// `None` for files that are never transcoded (uploaded sources).
    pub transcoding_status: Option<String>,
    pub original_filename: Option<String>,
    /// JSON array of bar heights.
    pub waveform: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TrackFile {
    pub fn quality(&self) -> Option<Quality> {
        Quality::parse(&self.quality)
    }

    pub fn status(&self) -> Option<TranscodingStatus> {
        self.transcoding_status
            .as_deref()
            .and_then(TranscodingStatus::parse)
    }

    /// Whether the file can be served: either it never needed transcoding
    /// or its transcode completed.
    pub fn is_available(&self) -> bool {
        matches!(
            self.transcoding_status.as_deref(),
            None | Some("completed")
        )
    }
}

/// DTO for creating a new track file.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrackFile {
    pub version_id: DbId,
    pub quality: Quality,
    pub file_path: String,
    pub file_size: i64,
    pub format: String,
    pub bitrate: Option<i64>,
    pub content_hash: Option<String>,
    pub transcoding_status: Option<TranscodingStatus>,
    pub original_filename: Option<String>,
}

/// A lossy encode left unfinished, joined with everything needed to queue
/// it again.
#[derive(Debug, Clone, FromRow)]
pub struct UnfinishedTranscode {
    pub track_file_id: DbId,
    pub version_id: DbId,
    pub track_public_id: String,
    /// Track owner, used as the notification recipient.
    pub user_id: DbId,
    pub source_path: String,
    pub output_path: String,
}
