//! Track access decisions.
//!
//! Ownership beats a direct track grant, which beats a project grant. The
//! first matching source decides every flag; grants are never merged.

use serde::Serialize;

use crate::types::DbId;

/// Edit/download flags carried by a share grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareGrant {
    pub can_edit: bool,
    pub can_download: bool,
}

/// Outcome of an access check. Computed per request, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessResult {
    pub has_access: bool,
    pub can_edit: bool,
    pub can_download: bool,
    pub is_owner: bool,
}

impl AccessResult {
    /// Full access for the owner of the track's project.
    pub fn owner() -> Self {
        Self {
            has_access: true,
            can_edit: true,
            can_download: true,
            is_owner: true,
        }
    }

    /// Access granted through a share, with the share's own flags.
    pub fn granted(grant: ShareGrant) -> Self {
        Self {
            has_access: true,
            can_edit: grant.can_edit,
            can_download: grant.can_download,
            is_owner: false,
        }
    }

    /// No access at all.
    pub fn denied() -> Self {
        Self::default()
    }
}

/// Evaluate access from already-loaded facts.
///
/// `project_owner` is `None` when the project could not be found, in which
/// case only grants can give access.
pub fn evaluate_access(
    project_owner: Option<DbId>,
    user_id: DbId,
    track_grant: Option<ShareGrant>,
    project_grant: Option<ShareGrant>,
) -> AccessResult {
    if project_owner == Some(user_id) {
        return AccessResult::owner();
    }
    track_grant
        .or(project_grant)
        .map(AccessResult::granted)
        .unwrap_or_else(AccessResult::denied)
}
