//! Units of transcode work.

use std::path::PathBuf;

use vault_core::types::DbId;
use vault_db::models::track_file::UnfinishedTranscode;

/// One lossy encode waiting in, or taken from, the queue.
///
/// Jobs live only in memory; the `pending` track file row is the durable
/// trace that one was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The lossy track file row this job advances.
    pub track_file_id: DbId,
    pub version_id: DbId,
    pub track_public_id: String,
    /// Recipient of progress notifications.
    pub user_id: DbId,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
}

impl From<UnfinishedTranscode> for Job {
    fn from(row: UnfinishedTranscode) -> Self {
        Self {
            track_file_id: row.track_file_id,
            version_id: row.version_id,
            track_public_id: row.track_public_id,
            user_id: row.user_id,
            source_path: PathBuf::from(row.source_path),
            output_path: PathBuf::from(row.output_path),
        }
    }
}

/// Request to produce the lossy copy of a freshly uploaded version.
#[derive(Debug, Clone)]
pub struct TranscodeVersionInput {
    pub version_id: DbId,
    pub source_path: PathBuf,
    pub track_public_id: String,
    pub user_id: DbId,
}
