use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::creation::{CreationRow, NewCreation};

/// Append-only access to the `creations` table. There is no update or delete.
#[async_trait]
pub trait CreationStore: Send + Sync {
    async fn insert(&self, creation: &NewCreation) -> Result<Uuid>;

    /// All records owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<CreationRow>>;

    /// All published records, newest first.
    async fn list_published(&self) -> Result<Vec<CreationRow>>;
}

#[derive(Clone)]
pub struct PgCreationStore {
    pool: PgPool,
}

impl PgCreationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreationStore for PgCreationStore {
    async fn insert(&self, creation: &NewCreation) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO creations (user_id, prompt, content, type, publish)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&creation.user_id)
        .bind(&creation.prompt)
        .bind(&creation.content)
        .bind(creation.kind.as_str())
        .bind(creation.publish)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Inserted {} creation {id} for user {}",
            creation.kind, creation.user_id
        );
        Ok(id)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<CreationRow>> {
        Ok(sqlx::query_as::<_, CreationRow>(
            "SELECT * FROM creations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_published(&self) -> Result<Vec<CreationRow>> {
        Ok(sqlx::query_as::<_, CreationRow>(
            "SELECT * FROM creations WHERE publish = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
