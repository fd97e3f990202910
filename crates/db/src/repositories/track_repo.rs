//! Repository for the `tracks` table.

use sqlx::PgPool;
use vault_core::types::DbId;

use crate::models::track::{CreateTrack, Track};

const COLUMNS: &str =
    "id, public_id, project_id, user_id, title, active_version_id, created_at, updated_at";

pub struct TrackRepo;

impl TrackRepo {
    /// Insert a new track with a freshly generated public id and no
    /// active version.
    pub async fn create(pool: &PgPool, input: &CreateTrack) -> Result<Track, sqlx::Error> {
        let query = format!(
            "INSERT INTO tracks (public_id, project_id, user_id, title)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(crate::new_public_id())
            .bind(input.project_id)
            .bind(input.user_id)
            .bind(&input.title)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Track>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracks WHERE id = $1");
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_public_id(
        pool: &PgPool,
        public_id: &str,
    ) -> Result<Option<Track>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracks WHERE public_id = $1");
        sqlx::query_as::<_, Track>(&query)
            .bind(public_id)
            .fetch_optional(pool)
            .await
    }

    /// Point the track at one of its own versions.
    ///
    /// Returns `false` if the track does not exist or the version belongs
    /// to a different track.
    pub async fn set_active_version(
        pool: &PgPool,
        track_id: DbId,
        version_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tracks SET active_version_id = $2, updated_at = NOW()
             WHERE id = $1
               AND EXISTS (SELECT 1 FROM track_versions WHERE id = $2 AND track_id = $1)",
        )
        .bind(track_id)
        .bind(version_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
