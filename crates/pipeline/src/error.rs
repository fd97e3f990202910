use vault_core::error::CoreError;
use vault_core::types::DbId;

/// Failure reported by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure submitting or recovering transcode work.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to create track file record: {0}")]
    CreateTrackFile(#[source] StoreError),

    #[error("Failed to list unfinished transcodes: {0}")]
    ListUnfinished(#[source] StoreError),
}

/// Failure locating a file to stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// No tier of the version has a servable file right now.
    #[error("No available file for this version")]
    NotAvailable,

    #[error("Track not found")]
    TrackNotFound,

    #[error("Access denied")]
    Forbidden,

    #[error("Track has no active version")]
    NoActiveVersion,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
