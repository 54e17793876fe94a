// src/db/note_repository.rs
// DOCUMENTATION: Database access for notes and tombstones
// PURPOSE: Spatial queries and counters for geotagged notes

use crate::errors::BoardError;
use crate::models::{NewNote, Note};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Column list shared by every note SELECT / RETURNING
/// DOCUMENTATION: location is split into lat/lng via ST_Y()/ST_X()
pub(crate) const NOTE_COLUMNS: &str = r#"
    id, firebase_id, user_id, content, summary,
    ST_Y(location) AS lat, ST_X(location) AS lng,
    created_at, likes_count, comments_count,
    image_base64, image_width, image_height
"#;

/// NoteRepository: All database operations for notes
/// DOCUMENTATION: Uses query_as with PostGIS geometry(Point,4326)
pub struct NoteRepository;

impl NoteRepository {
    /// Insert a note and return the stored row
    /// Used by POST /api/notes and by the Firestore import
    pub async fn create(pool: &PgPool, note: &NewNote) -> Result<Note, BoardError> {
        let sql = format!(
            r#"
            INSERT INTO notes (
                user_id, firebase_id, content, summary, location,
                created_at, likes_count, comments_count,
                image_base64, image_width, image_height
            )
            VALUES (
                $1, $2, $3, $4,
                CASE WHEN $5::float8 IS NULL THEN NULL
                     ELSE ST_SetSRID(ST_MakePoint($5, $6), 4326) END,
                COALESCE($7, NOW()), $8, $9,
                $10, $11, $12
            )
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );

        let created = sqlx::query_as::<_, Note>(&sql)
            .bind(note.user_id) // $1
            .bind(&note.firebase_id) // $2
            .bind(&note.content) // $3
            .bind(&note.summary) // $4
            .bind(note.location.map(|p| p.x())) // $5 - longitude
            .bind(note.location.map(|p| p.y())) // $6 - latitude
            .bind(note.created_at) // $7
            .bind(note.likes_count.max(0)) // $8
            .bind(note.comments_count.max(0)) // $9
            .bind(&note.image_base64) // $10
            .bind(note.image_width) // $11
            .bind(note.image_height) // $12
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to create note for user {}: {}", note.user_id, e);
                BoardError::DatabaseError(e.to_string())
            })?;

        log::debug!("Created note {} for user {}", created.id, created.user_id);
        Ok(created)
    }

    /// Set the Firestore document id of a note after it was mirrored
    pub async fn set_firebase_id(
        pool: &PgPool,
        id: Uuid,
        firebase_id: &str,
    ) -> Result<(), BoardError> {
        sqlx::query("UPDATE notes SET firebase_id = $2 WHERE id = $1")
            .bind(id)
            .bind(firebase_id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to set firebase id of note {}: {}", id, e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(())
    }

    /// Get note by UUID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Note, BoardError> {
        let sql = format!("SELECT {} FROM notes WHERE id = $1", NOTE_COLUMNS);
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching note: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| {
                log::warn!("Note not found: {}", id);
                BoardError::NotFound(format!("Note {}", id))
            })
    }

    /// All notes, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Note>, BoardError> {
        let sql = format!("SELECT {} FROM notes ORDER BY created_at DESC", NOTE_COLUMNS);
        sqlx::query_as::<_, Note>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing notes: {}", e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Note>, BoardError> {
        let sql = format!(
            "SELECT {} FROM notes WHERE user_id = $1 ORDER BY created_at DESC",
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error listing notes of user {}: {}", user_id, e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    /// Notes within `radius_m` meters of a point, nearest first
    /// DOCUMENTATION: geography cast makes ST_DWithin work in meters
    pub async fn find_nearby(
        pool: &PgPool,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> Result<Vec<Note>, BoardError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM notes
            WHERE location IS NOT NULL
              AND ST_DWithin(
                    location::geography,
                    ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                    $3
                  )
            ORDER BY ST_Distance(
                    location::geography,
                    ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography
                  ) ASC
            "#,
            NOTE_COLUMNS
        );

        log::debug!("Nearby query at ({}, {}) within {} m", lat, lng, radius_m);

        sqlx::query_as::<_, Note>(&sql)
            .bind(lng) // $1
            .bind(lat) // $2
            .bind(radius_m) // $3
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Nearby query failed: {}", e);
                BoardError::DatabaseError(e.to_string())
            })
    }

    /// Bump comments_count by one
    pub async fn increment_comments_count(pool: &PgPool, id: Uuid) -> Result<i32, BoardError> {
        let (count,): (i32,) = sqlx::query_as(
            "UPDATE notes SET comments_count = comments_count + 1 WHERE id = $1 RETURNING comments_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to increment comments of note {}: {}", id, e);
            BoardError::DatabaseError(e.to_string())
        })?;
        Ok(count)
    }

    /// Delete a note and leave a tombstone so a re-import skips it
    /// DOCUMENTATION: Both writes share one transaction
    pub async fn delete_with_tombstone(pool: &PgPool, note: &Note) -> Result<(), BoardError> {
        let mut tx = pool.begin().await?;

        sqlx::query("INSERT INTO deleted_notes (content, firebase_doc_id) VALUES ($1, $2)")
            .bind(note.content.clone().unwrap_or_default())
            .bind(&note.firebase_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("Failed to record tombstone for note {}: {}", note.id, e);
                BoardError::DatabaseError(e.to_string())
            })?;

        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(note.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("Failed to delete note {}: {}", note.id, e);
                BoardError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(BoardError::NotFound(format!("Note {}", note.id)));
        }

        tx.commit().await?;
        log::info!("Deleted note {}", note.id);
        Ok(())
    }

    /// Creation timestamps of every note; input of engagement analytics
    pub async fn list_created_at(pool: &PgPool) -> Result<Vec<DateTime<Utc>>, BoardError> {
        let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as("SELECT created_at FROM notes")
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Database error reading note timestamps: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    pub async fn count(pool: &PgPool) -> Result<i64, BoardError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes")
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Database error counting notes: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(count)
    }

    pub async fn delete_all(pool: &PgPool) -> Result<u64, BoardError> {
        let result = sqlx::query("DELETE FROM notes")
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to clear notes: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(result.rows_affected())
    }
}

/// DeletedNoteRepository: tombstones consulted by the Firestore import
pub struct DeletedNoteRepository;

impl DeletedNoteRepository {
    /// True when a note with this Firestore doc id or content was deleted
    pub async fn is_tombstoned(
        pool: &PgPool,
        firebase_doc_id: &str,
        content: &str,
    ) -> Result<bool, BoardError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM deleted_notes
                WHERE firebase_doc_id = $1 OR content = $2
            )
            "#,
        )
        .bind(firebase_doc_id)
        .bind(content)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Database error checking tombstones: {}", e);
            BoardError::DatabaseError(e.to_string())
        })?;
        Ok(exists)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, BoardError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM deleted_notes")
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Database error counting tombstones: {}", e);
                BoardError::DatabaseError(e.to_string())
            })?;
        Ok(count)
    }
}
