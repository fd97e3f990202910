use vault_core::access::{evaluate_access, AccessResult};
use vault_core::types::DbId;

use crate::error::StoreError;
use crate::store::AccessStore;

/// Decide what `user_id` may do with a track.
///
/// Ownership is checked first, then a direct track grant, then a project
/// grant. Lookups stop at the first match, so a track grant shadows any
/// project grant instead of merging with it.
pub async fn check_track_access<S: AccessStore + ?Sized>(
    store: &S,
    track_id: DbId,
    project_id: DbId,
    user_id: DbId,
) -> Result<AccessResult, StoreError> {
    let owner = store.project_owner(project_id).await?;
    if owner == Some(user_id) {
        return Ok(AccessResult::owner());
    }

    let track_grant = store.track_grant(track_id, user_id).await?;
    let project_grant = match track_grant {
        Some(_) => None,
        None => store.project_grant(project_id, user_id).await?,
    };

    Ok(evaluate_access(owner, user_id, track_grant, project_grant))
}
