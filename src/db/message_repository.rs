// src/db/message_repository.rs
// DOCUMENTATION: Direct message storage

use crate::errors::BoardError;
use crate::models::Message;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const MESSAGE_COLUMNS: &str =
    "id, from_user_id, to_user_id, text, is_anonymous, is_read, created_at";

pub struct MessageRepository;

impl MessageRepository {
    pub async fn create(
        pool: &PgPool,
        from_user_id: Uuid,
        to_user_id: Uuid,
        text: &str,
        is_anonymous: bool,
    ) -> Result<Message, BoardError> {
        let sql = format!(
            r#"
            INSERT INTO messages (from_user_id, to_user_id, text, is_anonymous)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(from_user_id)
            .bind(to_user_id)
            .bind(text)
            .bind(is_anonymous)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to store message {} -> {}: {}", from_user_id, to_user_id, e);
                BoardError::DatabaseError(e.to_string())
            })?;

        log::info!("Stored message {} for {}", message.id, to_user_id);
        Ok(message)
    }

    /// Store a message read back from Firestore, keeping its flags and time
    pub async fn import(
        pool: &PgPool,
        from_user_id: Uuid,
        to_user_id: Uuid,
        text: &str,
        is_anonymous: bool,
        is_read: bool,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Message, BoardError> {
        let sql = format!(
            r#"
            INSERT INTO messages (from_user_id, to_user_id, text, is_anonymous, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()))
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(from_user_id)
            .bind(to_user_id)
            .bind(text)
            .bind(is_anonymous)
            .bind(is_read)
            .bind(created_at)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to import message {} -> {}: {}", from_user_id, to_user_id, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    /// Messages received by a user, newest first
    pub async fn list_to_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Message>, BoardError> {
        let sql = format!(
            "SELECT {} FROM messages WHERE to_user_id = $1 ORDER BY created_at DESC",
            MESSAGE_COLUMNS
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing inbox of {}: {}", user_id, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    /// Messages sent by a user, newest first
    pub async fn list_from_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Message>, BoardError> {
        let sql = format!(
            "SELECT {} FROM messages WHERE from_user_id = $1 ORDER BY created_at DESC",
            MESSAGE_COLUMNS
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing sent messages of {}: {}", user_id, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<Message, BoardError> {
        let sql = format!(
            "UPDATE messages SET is_read = TRUE WHERE id = $1 RETURNING {}",
            MESSAGE_COLUMNS
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to mark message {} read: {}", id, e);
                BoardError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| {
                log::warn!("Message not found: {}", id);
                BoardError::NotFound(format!("Message {}", id))
            })
    }

    pub async fn delete_all(pool: &PgPool) -> Result<u64, BoardError> {
        let result = sqlx::query("DELETE FROM messages")
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to clear messages: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(result.rows_affected())
    }
}
