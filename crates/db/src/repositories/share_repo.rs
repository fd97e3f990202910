//! Repository for direct track and project share grants.

use sqlx::PgPool;
use vault_core::types::DbId;

use crate::models::share::{ProjectShare, TrackShare};

const TRACK_COLUMNS: &str =
    "id, track_id, shared_by, shared_to, can_edit, can_download, created_at, updated_at";
const PROJECT_COLUMNS: &str =
    "id, project_id, shared_by, shared_to, can_edit, can_download, created_at, updated_at";

pub struct ShareRepo;

impl ShareRepo {
    /// Share a track with a user, replacing any existing grant's flags.
    pub async fn grant_track(
        pool: &PgPool,
        track_id: DbId,
        shared_by: DbId,
        shared_to: DbId,
        can_edit: bool,
        can_download: bool,
    ) -> Result<TrackShare, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_track_shares (track_id, shared_by, shared_to, can_edit, can_download)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_user_track_shares_track_user DO UPDATE
                SET can_edit = EXCLUDED.can_edit,
                    can_download = EXCLUDED.can_download,
                    updated_at = NOW()
             RETURNING {TRACK_COLUMNS}"
        );
        sqlx::query_as::<_, TrackShare>(&query)
            .bind(track_id)
            .bind(shared_by)
            .bind(shared_to)
            .bind(can_edit)
            .bind(can_download)
            .fetch_one(pool)
            .await
    }

    /// Share a whole project with a user, replacing any existing grant's flags.
    pub async fn grant_project(
        pool: &PgPool,
        project_id: DbId,
        shared_by: DbId,
        shared_to: DbId,
        can_edit: bool,
        can_download: bool,
    ) -> Result<ProjectShare, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_project_shares (project_id, shared_by, shared_to, can_edit, can_download)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_user_project_shares_project_user DO UPDATE
                SET can_edit = EXCLUDED.can_edit,
                    can_download = EXCLUDED.can_download,
                    updated_at = NOW()
             RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectShare>(&query)
            .bind(project_id)
            .bind(shared_by)
            .bind(shared_to)
            .bind(can_edit)
            .bind(can_download)
            .fetch_one(pool)
            .await
    }

    pub async fn find_track_share(
        pool: &PgPool,
        track_id: DbId,
        user_id: DbId,
    ) -> Result<Option<TrackShare>, sqlx::Error> {
        let query = format!(
            "SELECT {TRACK_COLUMNS} FROM user_track_shares WHERE track_id = $1 AND shared_to = $2"
        );
        sqlx::query_as::<_, TrackShare>(&query)
            .bind(track_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_project_share(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ProjectShare>, sqlx::Error> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM user_project_shares \
             WHERE project_id = $1 AND shared_to = $2"
        );
        sqlx::query_as::<_, ProjectShare>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
