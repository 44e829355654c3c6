//! The chat transcript.

use chrono::{DateTime, Utc};
use karte_types::{ChatMessage, MessageId, Role};
use sqlx::SqlitePool;

use crate::error::DbError;

/// Operations on the `chat_messages` table.
pub struct ChatStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChatStore<'a> {
    /// Create a new chat store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a message to the transcript and return it.
    pub async fn append(&self, role: Role, content: &str) -> Result<ChatMessage, DbError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            "INSERT INTO chat_messages (role, content, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING id, role, content, created_at",
        )
        .bind(role.as_str())
        .bind(content)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;
        Ok(row.into_message())
    }

    /// The full transcript in insertion order.
    pub async fn list(&self) -> Result<Vec<ChatMessage>, DbError> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            "SELECT id, role, content, created_at FROM chat_messages ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(ChatMessageRow::into_message).collect())
    }

    /// Delete the whole transcript. Returns the number of rows removed.
    pub async fn clear(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM chat_messages")
            .execute(self.pool)
            .await?;
        tracing::debug!(removed = result.rows_affected(), "Cleared chat transcript");
        Ok(result.rows_affected())
    }
}

/// A row from the `chat_messages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatMessageRow {
    /// Row id.
    pub id: i64,
    /// Role tag.
    pub role: String,
    /// Message text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl ChatMessageRow {
    /// Convert the raw row into the shared [`ChatMessage`] type.
    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: MessageId(self.id),
            role: Role::from_tag(&self.role),
            content: self.content,
            created_at: self.created_at,
        }
    }
}
