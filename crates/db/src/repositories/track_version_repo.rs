//! Repository for the `track_versions` table.

use sqlx::PgPool;
use vault_core::types::DbId;

use crate::models::track::{CreateTrackVersion, TrackVersion};

const COLUMNS: &str = "id, track_id, version_name, notes, duration_seconds, version_order, \
    created_at, updated_at";

pub struct TrackVersionRepo;

impl TrackVersionRepo {
    /// Insert a new version, defaulting `version_order` to one past the
    /// track's current highest.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTrackVersion,
    ) -> Result<TrackVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO track_versions (track_id, version_name, notes, duration_seconds, version_order)
             VALUES (
                $1, $2, $3, $4,
                COALESCE($5, (SELECT COALESCE(MAX(version_order), 0) + 1
                              FROM track_versions WHERE track_id = $1))
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrackVersion>(&query)
            .bind(input.track_id)
            .bind(&input.version_name)
            .bind(&input.notes)
            .bind(input.duration_seconds)
            .bind(input.version_order)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TrackVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM track_versions WHERE id = $1");
        sqlx::query_as::<_, TrackVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All versions of a track, lowest `version_order` first.
    pub async fn list_by_track(
        pool: &PgPool,
        track_id: DbId,
    ) -> Result<Vec<TrackVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM track_versions WHERE track_id = $1 ORDER BY version_order, id"
        );
        sqlx::query_as::<_, TrackVersion>(&query)
            .bind(track_id)
            .fetch_all(pool)
            .await
    }

    /// Record the probed duration of the version's source.
    pub async fn update_duration(
        pool: &PgPool,
        id: DbId,
        duration_seconds: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE track_versions SET duration_seconds = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(duration_seconds)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a version unless its track currently marks it active.
    ///
    /// Returns `true` if a row was removed; `false` if it does not exist or
    /// is the active version.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM track_versions v
             WHERE v.id = $1
               AND NOT EXISTS (SELECT 1 FROM tracks t WHERE t.active_version_id = v.id)",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
