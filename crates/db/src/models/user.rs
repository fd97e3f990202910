//! User and user preference models.

use serde::Serialize;
use sqlx::FromRow;
use vault_core::quality::Quality;
use vault_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `user_preferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserPreferences {
    pub user_id: DbId,
    pub default_quality: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserPreferences {
    pub fn default_quality(&self) -> Option<Quality> {
        Quality::parse(&self.default_quality)
    }
}
