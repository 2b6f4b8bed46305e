//! Notification repository for database operations

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::models::{NewNotification, Notification, Page};
use crate::repositories::NotificationRepository;

const NOTIFICATION_COLUMNS: &str = "id, user_id, message, kind, contact_details, read, created_at";

fn notification_from_row(row: &PgRow) -> RepositoryResult<Notification> {
    let kind: String = row.get("kind");

    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        message: row.get("message"),
        kind: kind.parse()?,
        contact_details: row.get("contact_details"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    })
}

/// Notification repository
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn record(&self, notification: &NewNotification) -> RepositoryResult<Notification> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notifications (user_id, message, kind, contact_details)
            VALUES ($1, $2, $3, $4)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification.user_id)
        .bind(&notification.message)
        .bind(notification.kind.as_str())
        .bind(&notification.contact_details)
        .fetch_one(&self.pool)
        .await?;

        notification_from_row(&row)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> RepositoryResult<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
