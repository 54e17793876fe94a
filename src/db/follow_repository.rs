// src/db/follow_repository.rs
// DOCUMENTATION: Follow edges between users
// PURPOSE: Edge rows and the follower/following counters move together

use super::user_repository::USER_COLUMNS;
use crate::errors::BoardError;
use crate::models::User;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub struct FollowRepository;

impl FollowRepository {
    /// Create an edge; returns false when it already existed
    pub async fn create(pool: &PgPool, follower_id: Uuid, followed_id: Uuid) -> Result<bool, BoardError> {
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO user_follows (follower_id, followed_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to follow {} -> {}: {}", follower_id, followed_id, e);
            BoardError::DatabaseError(e.to_string())
        })?
        .rows_affected()
            > 0;

        if inserted {
            Self::shift_counts(&mut tx, follower_id, followed_id, 1).await?;
        }
        tx.commit().await?;

        Ok(inserted)
    }

    /// Remove an edge; returns false when there was none
    pub async fn delete(pool: &PgPool, follower_id: Uuid, followed_id: Uuid) -> Result<bool, BoardError> {
        let mut tx = pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM user_follows WHERE follower_id = $1 AND followed_id = $2",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to unfollow {} -> {}: {}", follower_id, followed_id, e);
            BoardError::DatabaseError(e.to_string())
        })?
        .rows_affected()
            > 0;

        if removed {
            Self::shift_counts(&mut tx, follower_id, followed_id, -1).await?;
        }
        tx.commit().await?;

        Ok(removed)
    }

    /// Restore an imported edge; counters come with the imported profiles
    pub async fn insert_edge(pool: &PgPool, follower_id: Uuid, followed_id: Uuid) -> Result<bool, BoardError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_follows (follower_id, followed_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to restore follow {} -> {}: {}", follower_id, followed_id, e);
            BoardError::DatabaseError(e.to_string())
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn shift_counts(
        tx: &mut Transaction<'_, Postgres>,
        follower_id: Uuid,
        followed_id: Uuid,
        delta: i32,
    ) -> Result<(), BoardError> {
        sqlx::query(
            "UPDATE users SET following_count = GREATEST(following_count + $2, 0) WHERE id = $1",
        )
        .bind(follower_id)
        .bind(delta)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            "UPDATE users SET followers_count = GREATEST(followers_count + $2, 0) WHERE id = $1",
        )
        .bind(followed_id)
        .bind(delta)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn exists(pool: &PgPool, follower_id: Uuid, followed_id: Uuid) -> Result<bool, BoardError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM user_follows WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Database error checking follow edge: {}", e);
            BoardError::DatabaseError(e.to_string())
        })?;
        Ok(exists)
    }

    /// Users following `user_id`, most recent first
    pub async fn followers_of(pool: &PgPool, user_id: Uuid) -> Result<Vec<User>, BoardError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users
            JOIN user_follows f ON f.follower_id = users.id
            WHERE f.followed_id = $1
            ORDER BY f.created_at DESC
            "#,
            qualified_user_columns()
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing followers of {}: {}", user_id, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    /// Users `user_id` follows, most recent first
    pub async fn following_of(pool: &PgPool, user_id: Uuid) -> Result<Vec<User>, BoardError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users
            JOIN user_follows f ON f.followed_id = users.id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
            qualified_user_columns()
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing following of {}: {}", user_id, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn delete_all(pool: &PgPool) -> Result<u64, BoardError> {
        let result = sqlx::query("DELETE FROM user_follows")
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to clear follows: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(result.rows_affected())
    }
}

/// USER_COLUMNS with every column prefixed by `users.`
/// DOCUMENTATION: user_follows also has id and created_at
fn qualified_user_columns() -> String {
    USER_COLUMNS
        .replace(" id,", " users.id,")
        .replace("(last_location)", "(users.last_location)")
        .replace("created_at", "users.created_at")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_columns_disambiguate_join() {
        let cols = qualified_user_columns();
        assert!(cols.contains("users.id,"));
        assert!(cols.contains("users.created_at"));
        assert!(cols.contains("ST_Y(users.last_location) AS lat"));
        assert!(!cols.contains(" id, name"));
    }
}
