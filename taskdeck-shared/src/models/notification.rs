/// Notification model and database operations
///
/// Notifications are the durable half of the delivery pipeline: every event
/// is written here first, and the real-time push is a best-effort extra on
/// top. A client that missed the push finds the record on its next list.
///
/// Rows are immutable except for the read flag, which only moves false→true.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     recipient_id UUID NOT NULL REFERENCES users(id),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     message TEXT NOT NULL,
///     read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Notification record for a single recipient
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// User this notification is for
    pub recipient_id: Uuid,

    /// Task the notification is about
    pub task_id: Uuid,

    /// Human-readable message text
    pub message: String,

    /// Whether the recipient has read the notification
    pub read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    /// Recipient user ID
    pub recipient_id: Uuid,

    /// Associated task ID
    pub task_id: Uuid,

    /// Message text
    pub message: String,
}

impl Notification {
    /// Creates a new unread notification
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when the
    /// recipient or task reference is invalid.
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (recipient_id, task_id, message)
            VALUES ($1, $2, $3)
            RETURNING id, recipient_id, task_id, message, read, created_at
            "#,
        )
        .bind(data.recipient_id)
        .bind(data.task_id)
        .bind(data.message)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Lists a user's notifications, newest first
    pub async fn list_by_recipient(
        pool: &PgPool,
        recipient_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, recipient_id, task_id, message, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Counts a user's unread notifications
    pub async fn count_unread(pool: &PgPool, recipient_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Marks a notification as read
    ///
    /// Scoped to the recipient so users cannot touch each other's rows.
    /// Idempotent: marking an already-read notification succeeds.
    ///
    /// # Returns
    ///
    /// True if the notification exists and belongs to the recipient
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1 AND recipient_id = $2
            "#,
        )
        .bind(id)
        .bind(recipient_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_notification_struct() {
        let data = CreateNotification {
            recipient_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            message: "You have been assigned a new task: Draft spec".to_string(),
        };

        assert!(data.message.contains("Draft spec"));
    }

    #[test]
    fn test_notification_wire_shape() {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            message: "Task \"Draft spec\" has been marked as completed".to_string(),
            read: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["read"], serde_json::json!(false));
        assert!(json["message"].as_str().unwrap().contains("Draft spec"));
    }

    // Integration tests for database operations require a running database
}
