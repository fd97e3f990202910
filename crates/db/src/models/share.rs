//! Direct user-to-user share grants.

use serde::Serialize;
use sqlx::FromRow;
use vault_core::access::ShareGrant;
use vault_core::types::{DbId, Timestamp};

/// A row from the `user_track_shares` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrackShare {
    pub id: DbId,
    pub track_id: DbId,
    pub shared_by: DbId,
    pub shared_to: DbId,
    pub can_edit: bool,
    pub can_download: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `user_project_shares` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectShare {
    pub id: DbId,
    pub project_id: DbId,
    pub shared_by: DbId,
    pub shared_to: DbId,
    pub can_edit: bool,
    pub can_download: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&TrackShare> for ShareGrant {
    fn from(share: &TrackShare) -> Self {
        ShareGrant {
            can_edit: share.can_edit,
            can_download: share.can_download,
        }
    }
}

impl From<&ProjectShare> for ShareGrant {
    fn from(share: &ProjectShare) -> Self {
        ShareGrant {
            can_edit: share.can_edit,
            can_download: share.can_download,
        }
    }
}
