//! Repository for the `track_files` table.

use sqlx::PgPool;
use vault_core::quality::Quality;
use vault_core::transcoding::TranscodingStatus;
use vault_core::types::DbId;

use crate::models::track_file::{CreateTrackFile, TrackFile, UnfinishedTranscode};

const COLUMNS: &str = "id, version_id, quality, file_path, file_size, format, bitrate, \
    content_hash, transcoding_status, original_filename, waveform, created_at, updated_at";

/// Provides CRUD operations for track files.
pub struct TrackFileRepo;

impl TrackFileRepo {
    /// Insert a new track file.
    ///
    /// Fails with a unique violation if the version already has a file at
    /// this quality.
    pub async fn create(pool: &PgPool, input: &CreateTrackFile) -> Result<TrackFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO track_files
                (version_id, quality, file_path, file_size, format, bitrate,
                 content_hash, transcoding_status, original_filename)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrackFile>(&query)
            .bind(input.version_id)
            .bind(input.quality.as_str())
            .bind(&input.file_path)
            .bind(input.file_size)
            .bind(&input.format)
            .bind(input.bitrate)
            .bind(&input.content_hash)
            .bind(input.transcoding_status.map(TranscodingStatus::as_str))
            .bind(&input.original_filename)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TrackFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM track_files WHERE id = $1");
        sqlx::query_as::<_, TrackFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The version's file at `quality`, whatever its transcoding status.
    pub async fn find(
        pool: &PgPool,
        version_id: DbId,
        quality: Quality,
    ) -> Result<Option<TrackFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM track_files WHERE version_id = $1 AND quality = $2"
        );
        sqlx::query_as::<_, TrackFile>(&query)
            .bind(version_id)
            .bind(quality.as_str())
            .fetch_optional(pool)
            .await
    }

    /// The version's file at `quality`, only if it can be served.
    ///
    /// Files without a transcoding status (uploaded sources) count as
    /// servable.
    pub async fn find_completed(
        pool: &PgPool,
        version_id: DbId,
        quality: Quality,
    ) -> Result<Option<TrackFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM track_files
             WHERE version_id = $1 AND quality = $2
               AND (transcoding_status IS NULL OR transcoding_status = 'completed')"
        );
        sqlx::query_as::<_, TrackFile>(&query)
            .bind(version_id)
            .bind(quality.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_version(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Vec<TrackFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM track_files WHERE version_id = $1 ORDER BY id");
        sqlx::query_as::<_, TrackFile>(&query)
            .bind(version_id)
            .fetch_all(pool)
            .await
    }

    /// Set the transcoding status of a track file.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update_transcoding_status(
        pool: &PgPool,
        id: DbId,
        status: TranscodingStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE track_files SET transcoding_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_file_size(
        pool: &PgPool,
        id: DbId,
        file_size: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE track_files SET file_size = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(file_size)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_content_hash(
        pool: &PgPool,
        id: DbId,
        content_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE track_files SET content_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(content_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store a serialized waveform (JSON array of bar heights).
    pub async fn update_waveform(
        pool: &PgPool,
        id: DbId,
        waveform_json: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE track_files SET waveform = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(waveform_json)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lossy files still `pending` or `processing`, joined with the source
    /// file of the same version and the owning track.
    ///
    /// Rows whose version has no source file are skipped.
    pub async fn list_unfinished_lossy(
        pool: &PgPool,
    ) -> Result<Vec<UnfinishedTranscode>, sqlx::Error> {
        sqlx::query_as::<_, UnfinishedTranscode>(
            "SELECT lossy.id AS track_file_id,
                    lossy.version_id,
                    t.public_id AS track_public_id,
                    t.user_id,
                    src.file_path AS source_path,
                    lossy.file_path AS output_path
             FROM track_files lossy
             JOIN track_files src
               ON src.version_id = lossy.version_id AND src.quality = 'source'
             JOIN track_versions v ON v.id = lossy.version_id
             JOIN tracks t ON t.id = v.track_id
             WHERE lossy.quality = 'lossy'
               AND lossy.transcoding_status IN ('pending', 'processing')
             ORDER BY lossy.id",
        )
        .fetch_all(pool)
        .await
    }
}

