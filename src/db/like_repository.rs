// src/db/like_repository.rs
// DOCUMENTATION: Note likes and the counters that follow them

use crate::errors::BoardError;
use sqlx::PgPool;
use uuid::Uuid;

const LOCK_NOTE_SQL: &str = "SELECT id FROM notes WHERE id = $1 FOR UPDATE";

/// Result of flipping a like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    /// True when the like was added, false when removed
    pub liked: bool,
    pub likes_count: i32,
}

pub struct LikeRepository;

impl LikeRepository {
    /// Add or remove a like in one transaction
    /// DOCUMENTATION: Keeps notes.likes_count and the owner's
    /// total_likes_received in step; neither drops below zero
    pub async fn toggle(pool: &PgPool, user_id: Uuid, note_id: Uuid) -> Result<LikeToggle, BoardError> {
        let mut tx = pool.begin().await?;

        // serializes concurrent toggles on the same note
        let locked: Option<(Uuid,)> = sqlx::query_as(LOCK_NOTE_SQL)
            .bind(note_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("Failed to lock note {}: {}", note_id, e);
                BoardError::DatabaseError(e.to_string())
            })?;
        if locked.is_none() {
            return Err(BoardError::NotFound(format!("Note {} not found", note_id)));
        }

        let removed = sqlx::query("DELETE FROM note_likes WHERE user_id = $1 AND note_id = $2")
            .bind(user_id)
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("Failed to remove like {} -> {}: {}", user_id, note_id, e);
                BoardError::DatabaseError(e.to_string())
            })?
            .rows_affected();

        let liked = removed == 0;
        if liked {
            sqlx::query("INSERT INTO note_likes (user_id, note_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(note_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    log::error!("Failed to add like {} -> {}: {}", user_id, note_id, e);
                    BoardError::DatabaseError(e.to_string())
                })?;
        }

        let delta: i32 = if liked { 1 } else { -1 };

        let (likes_count, owner_id): (i32, Uuid) = sqlx::query_as(
            r#"
            UPDATE notes
            SET likes_count = GREATEST(likes_count + $2, 0)
            WHERE id = $1
            RETURNING likes_count, user_id
            "#,
        )
        .bind(note_id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to update likes of note {}: {}", note_id, e);
            BoardError::DatabaseError(e.to_string())
        })?;

        sqlx::query(
            "UPDATE users SET total_likes_received = GREATEST(total_likes_received + $2, 0) WHERE id = $1",
        )
        .bind(owner_id)
        .bind(delta)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to update likes received of user {}: {}", owner_id, e);
            BoardError::DatabaseError(e.to_string())
        })?;

        tx.commit().await?;

        log::info!(
            "User {} {} note {} (now {} likes)",
            user_id,
            if liked { "liked" } else { "unliked" },
            note_id,
            likes_count
        );
        Ok(LikeToggle { liked, likes_count })
    }

    /// External ids of everyone who liked each note
    /// DOCUMENTATION: firebase_uid when present, else the user UUID
    pub async fn likers_of(
        pool: &PgPool,
        note_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, String)>, BoardError> {
        if note_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT l.note_id, COALESCE(u.firebase_uid, u.id::text)
            FROM note_likes l
            JOIN users u ON u.id = l.user_id
            WHERE l.note_id = ANY($1)
            ORDER BY l.created_at ASC
            "#,
        )
        .bind(note_ids)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Database error loading likers: {}", e);
            BoardError::DatabaseError(e.to_string())
        })
    }

    pub async fn delete_all(pool: &PgPool) -> Result<u64, BoardError> {
        let result = sqlx::query("DELETE FROM note_likes")
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to clear likes: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_locks_the_note_row() {
        assert!(LOCK_NOTE_SQL.starts_with("SELECT id FROM notes"));
        assert!(LOCK_NOTE_SQL.ends_with("FOR UPDATE"));
    }
}
