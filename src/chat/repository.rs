//! Repository for chat message operations.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{MessageRole, NewMessage, StoredMessage};

/// Repository over the append-only `messages` table.
///
/// Only inserts and ordered reads: no updates, no deletes. Two concurrent
/// appends for the same user may interleave in any order; the autoincrement
/// id preserves insertion order between equal timestamps.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new repository instance.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a chat turn.
    pub async fn append(&self, message: NewMessage) -> Result<StoredMessage> {
        let role = message.role.to_string();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO messages (user_id, role, content)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&message.user_id)
        .bind(&role)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await
        .context("inserting message")?;

        self.get_by_id(id).await
    }

    /// Get a message by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<StoredMessage> {
        sqlx::query_as::<_, StoredMessage>(
            "SELECT id, user_id, role, content, created_at FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("fetching message")
    }

    /// Get all messages for a user, oldest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredMessage>> {
        sqlx::query_as::<_, StoredMessage>(
            r#"
            SELECT id, user_id, role, content, created_at
            FROM messages
            WHERE user_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("fetching messages for user")
    }

    /// Count messages for a user.
    pub async fn count_for_user(&self, user_id: &str) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("counting messages for user")
    }
}
