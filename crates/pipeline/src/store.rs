//! Persistence seams used by the pipeline, and their Postgres backing.
//!
//! The traits are deliberately narrow so the worker pool and the stream
//! resolver can be driven by an in-memory store in tests.

use async_trait::async_trait;
use sqlx::PgPool;
use vault_core::access::ShareGrant;
use vault_core::quality::Quality;
use vault_core::transcoding::TranscodingStatus;
use vault_core::types::DbId;
use vault_db::models::track::{Track, TrackVersion};
use vault_db::models::track_file::{CreateTrackFile, TrackFile, UnfinishedTranscode};
use vault_db::repositories::{
    ProjectRepo, ShareRepo, TrackFileRepo, TrackRepo, TrackVersionRepo, UserPreferenceRepo,
};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Track file writes performed by transcode submission and the workers.
///
/// Updates address the row by id and fail with [`StoreError::NotFound`]
/// when it no longer exists.
#[async_trait]
pub trait TranscodeStore: Send + Sync {
    async fn create_track_file(&self, input: &CreateTrackFile) -> Result<TrackFile, StoreError>;

    async fn update_transcoding_status(
        &self,
        track_file_id: DbId,
        status: TranscodingStatus,
    ) -> Result<(), StoreError>;

    async fn update_file_size(&self, track_file_id: DbId, file_size: i64)
        -> Result<(), StoreError>;

    async fn update_content_hash(
        &self,
        track_file_id: DbId,
        content_hash: &str,
    ) -> Result<(), StoreError>;

    async fn update_waveform(
        &self,
        track_file_id: DbId,
        waveform_json: &str,
    ) -> Result<(), StoreError>;

    /// Lossy rows left `pending` or `processing`, ready to queue again.
    async fn list_unfinished_lossy(&self) -> Result<Vec<UnfinishedTranscode>, StoreError>;
}

/// Reads needed to choose a file to stream.
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// The version's file at `quality` if it is servable.
    async fn find_completed_file(
        &self,
        version_id: DbId,
        quality: Quality,
    ) -> Result<Option<TrackFile>, StoreError>;

    async fn find_track(&self, track_id: DbId) -> Result<Option<Track>, StoreError>;

    async fn find_version(&self, version_id: DbId) -> Result<Option<TrackVersion>, StoreError>;

    /// Raw quality override of a project, if one is set.
    async fn project_quality_override(
        &self,
        project_id: DbId,
    ) -> Result<Option<String>, StoreError>;

    /// Raw default quality preference of a user, if one is saved.
    async fn user_default_quality(&self, user_id: DbId) -> Result<Option<String>, StoreError>;
}

/// Reads needed to evaluate track access.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Owner of the project, `None` if the project does not exist.
    async fn project_owner(&self, project_id: DbId) -> Result<Option<DbId>, StoreError>;

    async fn track_grant(
        &self,
        track_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ShareGrant>, StoreError>;

    async fn project_grant(
        &self,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ShareGrant>, StoreError>;
}

// ---------------------------------------------------------------------------
// PgStore
// ---------------------------------------------------------------------------

/// All store traits backed by the `vault-db` repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn track_file_found(updated: bool, track_file_id: DbId) -> Result<(), StoreError> {
    if updated {
        Ok(())
    } else {
        Err(StoreError::NotFound {
            entity: "track_file",
            id: track_file_id,
        })
    }
}

#[async_trait]
impl TranscodeStore for PgStore {
    async fn create_track_file(&self, input: &CreateTrackFile) -> Result<TrackFile, StoreError> {
        Ok(TrackFileRepo::create(&self.pool, input).await?)
    }

    async fn update_transcoding_status(
        &self,
        track_file_id: DbId,
        status: TranscodingStatus,
    ) -> Result<(), StoreError> {
        let updated =
            TrackFileRepo::update_transcoding_status(&self.pool, track_file_id, status).await?;
        track_file_found(updated, track_file_id)
    }

    async fn update_file_size(
        &self,
        track_file_id: DbId,
        file_size: i64,
    ) -> Result<(), StoreError> {
        let updated = TrackFileRepo::update_file_size(&self.pool, track_file_id, file_size).await?;
        track_file_found(updated, track_file_id)
    }

    async fn update_content_hash(
        &self,
        track_file_id: DbId,
        content_hash: &str,
    ) -> Result<(), StoreError> {
        let updated =
            TrackFileRepo::update_content_hash(&self.pool, track_file_id, content_hash).await?;
        track_file_found(updated, track_file_id)
    }

    async fn update_waveform(
        &self,
        track_file_id: DbId,
        waveform_json: &str,
    ) -> Result<(), StoreError> {
        let updated =
            TrackFileRepo::update_waveform(&self.pool, track_file_id, waveform_json).await?;
        track_file_found(updated, track_file_id)
    }

    async fn list_unfinished_lossy(&self) -> Result<Vec<UnfinishedTranscode>, StoreError> {
        Ok(TrackFileRepo::list_unfinished_lossy(&self.pool).await?)
    }
}

#[async_trait]
impl StreamStore for PgStore {
    async fn find_completed_file(
        &self,
        version_id: DbId,
        quality: Quality,
    ) -> Result<Option<TrackFile>, StoreError> {
        Ok(TrackFileRepo::find_completed(&self.pool, version_id, quality).await?)
    }

    async fn find_track(&self, track_id: DbId) -> Result<Option<Track>, StoreError> {
        Ok(TrackRepo::find_by_id(&self.pool, track_id).await?)
    }

    async fn find_version(&self, version_id: DbId) -> Result<Option<TrackVersion>, StoreError> {
        Ok(TrackVersionRepo::find_by_id(&self.pool, version_id).await?)
    }

    async fn project_quality_override(
        &self,
        project_id: DbId,
    ) -> Result<Option<String>, StoreError> {
        let project = ProjectRepo::find_by_id(&self.pool, project_id).await?;
        Ok(project.and_then(|p| p.quality_override))
    }

    async fn user_default_quality(&self, user_id: DbId) -> Result<Option<String>, StoreError> {
        let prefs = UserPreferenceRepo::find_by_user(&self.pool, user_id).await?;
        Ok(prefs.map(|p| p.default_quality))
    }
}

#[async_trait]
impl AccessStore for PgStore {
    async fn project_owner(&self, project_id: DbId) -> Result<Option<DbId>, StoreError> {
        let project = ProjectRepo::find_by_id(&self.pool, project_id).await?;
        Ok(project.map(|p| p.user_id))
    }

    async fn track_grant(
        &self,
        track_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ShareGrant>, StoreError> {
        let share = ShareRepo::find_track_share(&self.pool, track_id, user_id).await?;
        Ok(share.as_ref().map(ShareGrant::from))
    }

    async fn project_grant(
        &self,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ShareGrant>, StoreError> {
        let share = ShareRepo::find_project_share(&self.pool, project_id, user_id).await?;
        Ok(share.as_ref().map(ShareGrant::from))
    }
}
