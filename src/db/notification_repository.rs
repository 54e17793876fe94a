// src/db/notification_repository.rs
// DOCUMENTATION: Notification database operations

use crate::errors::BoardError;
use crate::models::{NewNotification, Notification};
use sqlx::PgPool;
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, sender_id, note_id, type, message, is_read, created_at";

pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn create(pool: &PgPool, n: &NewNotification) -> Result<Notification, BoardError> {
        let sql = format!(
            r#"
            INSERT INTO notifications (recipient_id, sender_id, note_id, type, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        let created = sqlx::query_as::<_, Notification>(&sql)
            .bind(n.recipient_id)
            .bind(n.sender_id)
            .bind(n.note_id)
            .bind(&n.type_field)
            .bind(&n.message)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to create {} notification for {}: {}", n.type_field, n.recipient_id, e);
                BoardError::DatabaseError(e.to_string())
            })?;

        log::debug!("Notification {} ({}) -> {}", created.id, created.type_field, created.recipient_id);
        Ok(created)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Notification>, BoardError> {
        let sql = format!(
            "SELECT {} FROM notifications ORDER BY created_at DESC",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing notifications: {}", e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Notification, BoardError> {
        let sql = format!("SELECT {} FROM notifications WHERE id = $1", NOTIFICATION_COLUMNS);
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching notification {}: {}", id, e);
                BoardError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| {
                log::warn!("Notification not found: {}", id);
                BoardError::NotFound(format!("Notification {}", id))
            })
    }

    /// Notifications addressed to a user, newest first
    pub async fn list_by_recipient(pool: &PgPool, recipient_id: Uuid) -> Result<Vec<Notification>, BoardError> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(recipient_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing notifications of {}: {}", recipient_id, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    /// Mark one notification read; returns the updated row
    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<Notification, BoardError> {
        let sql = format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to mark notification {} read: {}", id, e);
                BoardError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| BoardError::NotFound(format!("Notification {}", id)))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), BoardError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to delete notification {}: {}", id, e);
                BoardError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(BoardError::NotFound(format!("Notification {}", id)));
        }
        Ok(())
    }

    pub async fn unread_count(pool: &PgPool, recipient_id: Uuid) -> Result<i64, BoardError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Database error counting unread notifications: {}", e);
            BoardError::DatabaseError(e.to_string())
        })?;
        Ok(count)
    }

    pub async fn delete_all(pool: &PgPool) -> Result<u64, BoardError> {
        let result = sqlx::query("DELETE FROM notifications")
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to clear notifications: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(result.rows_affected())
    }
}
