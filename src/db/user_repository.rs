// src/db/user_repository.rs
// DOCUMENTATION: Database access for users
// PURPOSE: All SQL touching the users table

use crate::errors::BoardError;
use crate::models::User;
use crate::models::NewUser;
use sqlx::PgPool;
use uuid::Uuid;

/// Column list shared by every user SELECT / RETURNING
/// DOCUMENTATION: last_location is split into lat/lng via ST_Y()/ST_X()
pub(crate) const USER_COLUMNS: &str = r#"
    id, name, email, password_hash, firebase_uid, profile_pic_url, current_tier,
    ST_Y(last_location) AS lat, ST_X(last_location) AS lng,
    followers_count, following_count, total_likes_received, created_at
"#;

/// UserRepository: All database operations for users
pub struct UserRepository;

impl UserRepository {
    /// Insert a user and return the stored row
    pub async fn create(pool: &PgPool, new_user: &NewUser) -> Result<User, BoardError> {
        let sql = format!(
            r#"
            INSERT INTO users (
                name, email, password_hash, firebase_uid, profile_pic_url, current_tier, last_location,
                followers_count, following_count
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                CASE WHEN $7::float8 IS NULL THEN NULL
                     ELSE ST_SetSRID(ST_MakePoint($7, $8), 4326) END,
                $9, $10
            )
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.firebase_uid)
            .bind(&new_user.profile_pic_url)
            .bind(&new_user.current_tier)
            .bind(new_user.last_location.map(|p| p.x())) // $7 - longitude
            .bind(new_user.last_location.map(|p| p.y())) // $8 - latitude
            .bind(new_user.followers_count.max(0))
            .bind(new_user.following_count.max(0))
            .fetch_one(pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return BoardError::AlreadyExists("User already exists".to_string());
                    }
                }
                log::error!("Failed to create user {}: {}", new_user.email, e);
                BoardError::DatabaseError(e.to_string())
            })?;

        log::info!("Created user {} ({})", user.email, user.id);
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, BoardError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching user {}: {}", id, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, BoardError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching user by email {}: {}", email, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn find_by_firebase_uid(pool: &PgPool, uid: &str) -> Result<Option<User>, BoardError> {
        let sql = format!("SELECT {} FROM users WHERE firebase_uid = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(uid)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching user by firebase uid {}: {}", uid, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    /// Fetch several users at once, in no particular order
    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<User>, BoardError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching {} users: {}", ids.len(), e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    /// Oldest user; used as the fallback actor when a request names nobody
    pub async fn find_first(pool: &PgPool) -> Result<Option<User>, BoardError> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at ASC, id ASC LIMIT 1",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching first user: {}", e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<User>, BoardError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at ASC", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing users: {}", e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn count(pool: &PgPool) -> Result<i64, BoardError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Database error counting users: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(count)
    }

    /// Overwrite name and picture; used to repair incomplete accounts
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        name: &str,
        profile_pic_url: Option<&str>,
    ) -> Result<User, BoardError> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $2, profile_pic_url = COALESCE($3, profile_pic_url)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .bind(profile_pic_url)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to update profile of user {}: {}", id, e);
                BoardError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| BoardError::NotFound(format!("User {}", id)))?;

        log::info!("Repaired profile of user {} -> {}", id, name);
        Ok(user)
    }

    /// Users with a NULL or blank name
    pub async fn list_nameless(pool: &PgPool) -> Result<Vec<User>, BoardError> {
        let sql = format!(
            "SELECT {} FROM users WHERE name IS NULL OR btrim(name) = ''",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing nameless users: {}", e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn delete_all(pool: &PgPool) -> Result<u64, BoardError> {
        let result = sqlx::query("DELETE FROM users")
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to clear users: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(result.rows_affected())
    }
}
