//! Message repository for database operations

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::models::{Message, NewMessage, Page};
use crate::repositories::MessageRepository;

const MESSAGE_COLUMNS: &str = "id, sender_id, recipient_id, listing_id, body, read, created_at";

fn message_from_row(row: &PgRow) -> Message {
    Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        listing_id: row.get("listing_id"),
        body: row.get("body"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    }
}

/// Message repository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn send(&self, message: &NewMessage) -> RepositoryResult<Message> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO messages (sender_id, recipient_id, listing_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(message.listing_id)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(message_from_row(&row))
    }

    async fn conversation(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        page: Page,
    ) -> RepositoryResult<Vec<Message>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user_id)
        .bind(other_id)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    async fn inbox(&self, user_id: Uuid, page: Page) -> RepositoryResult<Vec<Message>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    async fn mark_read_from(&self, reader_id: Uuid, sender_id: Uuid) -> RepositoryResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET read = TRUE WHERE recipient_id = $1 AND sender_id = $2 AND NOT read",
        )
        .bind(reader_id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
