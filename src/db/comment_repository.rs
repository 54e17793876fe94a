// src/db/comment_repository.rs
// DOCUMENTATION: Comment database operations

use crate::errors::BoardError;
use crate::models::Comment;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct CommentRepository;

impl CommentRepository {
    /// Insert a comment; `created_at` None means NOW()
    pub async fn create(
        pool: &PgPool,
        note_id: Uuid,
        user_id: Uuid,
        content: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Comment, BoardError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (note_id, user_id, content, created_at)
            VALUES ($1, $2, $3, COALESCE($4, NOW()))
            RETURNING id, note_id, user_id, content, created_at
            "#,
        )
        .bind(note_id)
        .bind(user_id)
        .bind(content)
        .bind(created_at)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create comment on note {}: {}", note_id, e);
            BoardError::DatabaseError(e.to_string())
        })?;

        log::debug!("Created comment {} on note {}", comment.id, note_id);
        Ok(comment)
    }

    /// Comments of a note, newest first
    pub async fn list_by_note(pool: &PgPool, note_id: Uuid) -> Result<Vec<Comment>, BoardError> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, note_id, user_id, content, created_at
            FROM comments
            WHERE note_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(note_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Database error listing comments of note {}: {}", note_id, e);
            BoardError::DatabaseError(e.to_string())
        })
    }

    pub async fn count(pool: &PgPool) -> Result<i64, BoardError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments")
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Database error counting comments: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(count)
    }

    pub async fn delete_all(pool: &PgPool) -> Result<u64, BoardError> {
        let result = sqlx::query("DELETE FROM comments")
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to clear comments: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(result.rows_affected())
    }
}
