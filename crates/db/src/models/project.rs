//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vault_core::quality::Quality;
use vault_core::types::{DbId, Timestamp};

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub public_id: String,
    /// Owner.
    pub user_id: DbId,
    pub name: String,
    /// Quality tier forced on every stream of this project's tracks.
    pub quality_override: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub user_id: DbId,
    pub name: String,
    pub quality_override: Option<Quality>,
}
