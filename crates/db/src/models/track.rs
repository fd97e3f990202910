//! Track and track version entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vault_core::types::{DbId, Timestamp};

/// A row from the `tracks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Track {
    pub id: DbId,
    pub public_id: String,
    pub project_id: DbId,
    /// Uploader.
    pub user_id: DbId,
    pub title: String,
    pub active_version_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new track.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrack {
    pub project_id: DbId,
    pub user_id: DbId,
    pub title: String,
}

/// A row from the `track_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrackVersion {
    pub id: DbId,
    pub track_id: DbId,
    pub version_name: String,
    pub notes: Option<String>,
    /// Populated once the source file has been probed.
    pub duration_seconds: Option<f64>,
    pub version_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new track version.
///
/// If `version_order` is `None`, the next order after the track's highest
/// existing version is used.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrackVersion {
    pub track_id: DbId,
    pub version_name: String,
    pub notes: Option<String>,
    pub duration_seconds: Option<f64>,
    pub version_order: Option<i32>,
}
