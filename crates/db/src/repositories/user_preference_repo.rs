//! Repository for the `user_preferences` table.

use sqlx::PgPool;
use vault_core::quality::Quality;
use vault_core::types::DbId;

use crate::models::user::UserPreferences;

const COLUMNS: &str = "user_id, default_quality, created_at, updated_at";

pub struct UserPreferenceRepo;

impl UserPreferenceRepo {
    /// Load a user's preferences. `None` if the user never saved any.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<UserPreferences>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_preferences WHERE user_id = $1");
        sqlx::query_as::<_, UserPreferences>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the user's default streaming quality.
    pub async fn set_default_quality(
        pool: &PgPool,
        user_id: DbId,
        quality: Quality,
    ) -> Result<UserPreferences, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_preferences (user_id, default_quality) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE
                SET default_quality = EXCLUDED.default_quality, updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserPreferences>(&query)
            .bind(user_id)
            .bind(quality.as_str())
            .fetch_one(pool)
            .await
    }
}
