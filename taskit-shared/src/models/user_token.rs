/// Session token storage
///
/// Every token handed out on signup or login gets a row here. Authentication
/// requires the row to exist, so deleting rows is how sessions end.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// An active session token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl UserToken {
    /// Appends a token to the user's active set
    pub async fn create(pool: &PgPool, user_id: Uuid, token: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserToken>(
            r#"
            INSERT INTO user_tokens (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's tokens, oldest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserToken>(
            r#"
            SELECT id, user_id, token, created_at
            FROM user_tokens
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Removes one token (logout). Returns false if it wasn't active.
    pub async fn delete(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every token of a user (logout everywhere)
    ///
    /// Returns the number of sessions ended.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
