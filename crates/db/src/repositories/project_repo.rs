//! Repository for the `projects` table.

use sqlx::PgPool;
use vault_core::quality::Quality;
use vault_core::types::DbId;

use crate::models::project::{CreateProject, Project};

const COLUMNS: &str = "id, public_id, user_id, name, quality_override, created_at, updated_at";

pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project with a freshly generated public id.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (public_id, user_id, name, quality_override)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(crate::new_public_id())
            .bind(input.user_id)
            .bind(&input.name)
            .bind(input.quality_override.map(Quality::as_str))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set or clear the project's quality override. Returns `true` if the
    /// project exists.
    pub async fn set_quality_override(
        pool: &PgPool,
        id: DbId,
        quality: Option<Quality>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET quality_override = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(quality.map(Quality::as_str))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
