/// Back-office notification model
///
/// Notifications are a flat feed for administrators. One is recorded whenever an
/// order is created. They reference orders weakly: deleting an order leaves its
/// notifications in place.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     message TEXT NOT NULL,
///     order_id UUID,
///     read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub order_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub message: String,
    pub order_id: Option<Uuid>,
}

impl CreateNotification {
    /// Notification recorded for a freshly created order
    pub fn order_created(order_id: Uuid, customer_name: &str) -> Self {
        Self {
            message: format!("New order created for {}", customer_name),
            order_id: Some(order_id),
        }
    }
}

const NOTIFICATION_COLUMNS: &str = "id, message, order_id, read, created_at";

impl Notification {
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (message, order_id) VALUES ($1, $2) RETURNING {}",
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(data.message)
            .bind(data.order_id)
            .fetch_one(pool)
            .await
    }

    /// Lists notifications newest first, optionally only unread ones
    pub async fn list(pool: &PgPool, unread_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM notifications WHERE ($1 = FALSE OR read = FALSE) ORDER BY created_at DESC",
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(unread_only)
            .fetch_all(pool)
            .await
    }

    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications SET read = TRUE WHERE id = $1 RETURNING {}",
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Marks every unread notification as read, returning how many changed
    pub async fn mark_all_read(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE read = FALSE")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
