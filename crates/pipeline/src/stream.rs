//! Choosing the file to stream for a version.

use std::path::PathBuf;

use vault_core::error::CoreError;
use vault_core::quality::{content_type_for_format, fallback_chain, resolve_quality, Quality};
use vault_core::types::DbId;
use vault_db::models::track_file::TrackFile;

use crate::access::check_track_access;
use crate::error::StreamError;
use crate::store::{AccessStore, StreamStore};

/// A servable file and how to label it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFile {
    pub track_file_id: DbId,
    pub path: PathBuf,
    /// Container format as stored, e.g. `"mp3"`.
    pub format: String,
    /// Tier actually served, which may differ from the one preferred.
    pub quality: Quality,
    pub content_type: &'static str,
}

impl StreamFile {
    fn new(file: TrackFile, quality: Quality) -> Self {
        Self {
            track_file_id: file.id,
            content_type: content_type_for_format(&file.format),
            path: PathBuf::from(file.file_path),
            format: file.format,
            quality,
        }
    }
}

/// Pick the file to stream for `version_id`.
///
/// The preferred tier comes from [`resolve_quality`]; if the version has
/// no servable file at that tier, lossy, source and lossless are tried in
/// that order. Exhausting every tier yields [`StreamError::NotAvailable`].
pub async fn resolve_stream_file<S: StreamStore + ?Sized>(
    store: &S,
    version_id: DbId,
    requested: Option<&str>,
    project_override: Option<&str>,
    user_default: Option<&str>,
) -> Result<StreamFile, StreamError> {
    let preferred = resolve_quality(requested, project_override, user_default);

    for quality in fallback_chain(preferred) {
        if let Some(file) = store.find_completed_file(version_id, quality).await? {
            if quality != preferred {
                tracing::debug!(
                    version_id,
                    preferred = %preferred,
                    served = %quality,
                    "Preferred quality unavailable, falling back"
                );
            }
            return Ok(StreamFile::new(file, quality));
        }
    }

    Err(StreamError::NotAvailable)
}

/// Locate the file `user_id` should be streamed for a track.
///
/// Checks access, picks `version_id` or the track's active version, then
/// resolves quality from the request, the project override and the user's
/// default preference.
pub async fn locate_stream<S>(
    store: &S,
    track_id: DbId,
    user_id: DbId,
    version_id: Option<DbId>,
    requested: Option<&str>,
) -> Result<StreamFile, StreamError>
where
    S: StreamStore + AccessStore + ?Sized,
{
    let track = store
        .find_track(track_id)
        .await?
        .ok_or(StreamError::TrackNotFound)?;

    let access = check_track_access(store, track.id, track.project_id, user_id).await?;
    if !access.has_access {
        return Err(StreamError::Forbidden);
    }

    let version_id = match version_id {
        Some(id) => {
            let belongs = store
                .find_version(id)
                .await?
                .is_some_and(|v| v.track_id == track.id);
            if !belongs {
                return Err(CoreError::NotFound {
                    entity: "track_version",
                    id,
                }
                .into());
            }
            id
        }
        None => track.active_version_id.ok_or(StreamError::NoActiveVersion)?,
    };

    let project_override = store.project_quality_override(track.project_id).await?;
    let user_default = store.user_default_quality(user_id).await?;

    resolve_stream_file(
        store,
        version_id,
        requested,
        project_override.as_deref(),
        user_default.as_deref(),
    )
    .await
}
