// src/services/note_service.rs
// DOCUMENTATION: Business logic for notes
// PURPOSE: Ownership, likes, spatial discovery and Firestore mirroring

use crate::db::{LikeRepository, NoteRepository, UserRepository};
use crate::errors::BoardError;
use crate::models::geo::validate_lat_lng;
use crate::models::{
    avatar_url, CreateNoteRequest, NearbyQuery, NewNote, Note, NoteResponse, NotificationKind,
    User, DEFAULT_AVATAR_STYLE, DEMO_USER_EMAIL, DEMO_USER_NAME,
};
use crate::services::{FirestoreClient, NotesCache, NotificationService, SyncService, UserService};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// Name to give an account that has none
pub fn repaired_name(email: &str) -> String {
    match email.split_once('@') {
        Some((local, _)) if !local.is_empty() => local.to_string(),
        _ => DEMO_USER_NAME.to_string(),
    }
}

pub struct NoteService;

impl NoteService {
    /// Attach owners and likers to notes
    async fn hydrate(pool: &PgPool, notes: Vec<Note>) -> Result<Vec<NoteResponse>, BoardError> {
        let owner_ids: Vec<Uuid> = notes.iter().map(|n| n.user_id).collect();
        let owners = UserService::map_by_id(pool, &owner_ids).await?;

        let note_ids: Vec<Uuid> = notes.iter().map(|n| n.id).collect();
        let mut likers: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (note_id, liker) in LikeRepository::likers_of(pool, &note_ids).await? {
            likers.entry(note_id).or_default().push(liker);
        }

        Ok(notes
            .iter()
            .map(|n| {
                n.to_response(
                    owners.get(&n.user_id).map(User::to_response),
                    likers.remove(&n.id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn hydrate_one(pool: &PgPool, note: Note) -> Result<NoteResponse, BoardError> {
        Self::hydrate(pool, vec![note])
            .await?
            .pop()
            .ok_or(BoardError::InternalError)
    }

    pub async fn list_notes(pool: &PgPool) -> Result<Vec<NoteResponse>, BoardError> {
        let notes = NoteRepository::list_all(pool).await?;
        Self::hydrate(pool, notes).await
    }

    pub async fn notes_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<NoteResponse>, BoardError> {
        let notes = NoteRepository::list_by_user(pool, user_id).await?;
        Self::hydrate(pool, notes).await
    }

    /// Create a note owned by `user_email`, or by the oldest user
    pub async fn create_note(
        pool: &PgPool,
        firestore: Option<&FirestoreClient>,
        cache: &NotesCache,
        req: &CreateNoteRequest,
        user_email: Option<&str>,
    ) -> Result<NoteResponse, BoardError> {
        req.validate()
            .map_err(|e| BoardError::ValidationError(e.to_string()))?;
        let location = req.resolve_location()?;

        let owner = match user_email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => {
                log::debug!("Creating note for user {}", email);
                UserRepository::find_by_email(pool, email)
                    .await?
                    .ok_or_else(|| BoardError::NotFound(format!("User not found with email: {}", email)))?
            }
            None => {
                log::debug!("No user email provided, using first user");
                UserRepository::find_first(pool)
                    .await?
                    .ok_or_else(|| BoardError::NotFound("No users found".to_string()))?
            }
        };

        let mut note = NoteRepository::create(
            pool,
            &NewNote {
                user_id: owner.id,
                firebase_id: req.firebase_id.clone(),
                content: Some(req.content.clone()),
                summary: req.summary.clone(),
                location,
                image_base64: req.image_base64.clone(),
                image_width: req.image_width,
                image_height: req.image_height,
                ..Default::default()
            },
        )
        .await?;
        cache.clear().await;

        if let Some(doc_id) = SyncService::sync_note(firestore, &note, &owner, &[]).await {
            if note.firebase_id.is_none() {
                NoteRepository::set_firebase_id(pool, note.id, &doc_id).await?;
                note.firebase_id = Some(doc_id);
            }
        }

        log::info!("User {} created note {}", owner.id, note.id);
        Ok(note.to_response(Some(owner.to_response()), Vec::new()))
    }

    /// Fetch a note; owners without a name are repaired on the way
    pub async fn get_note(pool: &PgPool, id: Uuid) -> Result<NoteResponse, BoardError> {
        let note = NoteRepository::get_by_id(pool, id).await?;

        if let Some(owner) = UserRepository::find_by_id(pool, note.user_id).await? {
            let nameless = owner.name.as_deref().map_or(true, |n| n.trim().is_empty());
            if nameless {
                let name = repaired_name(&owner.email);
                let pic = match owner.profile_pic_url.as_deref() {
                    Some(p) if !p.is_empty() => None,
                    _ => Some(avatar_url(&name, DEFAULT_AVATAR_STYLE)),
                };
                log::info!("Repairing nameless owner {} of note {}", owner.id, id);
                UserRepository::update_profile(pool, owner.id, &name, pic.as_deref()).await?;
            }
        }

        Self::hydrate_one(pool, note).await
    }

    /// Delete a note, leave a tombstone, remove its Firestore document
    pub async fn delete_note(
        pool: &PgPool,
        firestore: Option<&FirestoreClient>,
        cache: &NotesCache,
        id: Uuid,
    ) -> Result<(), BoardError> {
        let note = NoteRepository::get_by_id(pool, id).await?;
        NoteRepository::delete_with_tombstone(pool, &note).await?;
        cache.clear().await;

        // legacy notes were mirrored under their UUID
        SyncService::delete_note(firestore, &note.external_id()).await;
        Ok(())
    }

    /// Liker: the given user, else the demo account, else the oldest user
    async fn resolve_liker(pool: &PgPool, user_id: Option<Uuid>) -> Result<User, BoardError> {
        if let Some(id) = user_id {
            if let Some(user) = UserRepository::find_by_id(pool, id).await? {
                return Ok(user);
            }
            log::warn!("Liker {} not found, falling back to demo user", id);
        }
        if let Some(user) = UserRepository::find_by_email(pool, DEMO_USER_EMAIL).await? {
            return Ok(user);
        }
        UserRepository::find_first(pool)
            .await?
            .ok_or_else(|| BoardError::NotFound("No user found".to_string()))
    }

    pub async fn toggle_like(
        pool: &PgPool,
        firestore: Option<&FirestoreClient>,
        cache: &NotesCache,
        note_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<NoteResponse, BoardError> {
        let note = NoteRepository::get_by_id(pool, note_id).await?;
        let liker = Self::resolve_liker(pool, user_id).await?;

        let outcome = LikeRepository::toggle(pool, liker.id, note.id).await?;
        cache.clear().await;

        if outcome.liked {
            NotificationService::notify(pool, NotificationKind::Like, note.user_id, &liker, Some(note.id)).await;
        }

        SyncService::update_note_like(
            firestore,
            &note.external_id(),
            &liker.external_id(),
            outcome.liked,
        )
        .await;

        let updated = NoteRepository::get_by_id(pool, note_id).await?;
        Self::hydrate_one(pool, updated).await
    }

    /// Notes around a point, through the TTL cache
    pub async fn nearby(
        pool: &PgPool,
        cache: &NotesCache,
        query: &NearbyQuery,
    ) -> Result<Vec<NoteResponse>, BoardError> {
        validate_lat_lng(query.lat, query.lng)?;
        let radius = query.radius_m()?;
        let key = NotesCache::nearby_key(query.lat, query.lng, radius);

        if let Some(cached) = cache.get(&key).await {
            match serde_json::from_str::<Vec<NoteResponse>>(&cached) {
                Ok(notes) => return Ok(notes),
                Err(e) => log::warn!("Discarding unreadable cache entry {}: {}", key, e),
            }
        }

        let notes = NoteRepository::find_nearby(pool, query.lat, query.lng, radius).await?;
        let responses = Self::hydrate(pool, notes).await?;

        match serde_json::to_string(&responses) {
            Ok(json) => cache.set(key, json).await,
            Err(e) => log::warn!("Failed to cache nearby result: {}", e),
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repaired_name() {
        assert_eq!(repaired_name("ana@x.io"), "ana");
        assert_eq!(repaired_name("no-at-sign"), DEMO_USER_NAME);
        assert_eq!(repaired_name("@x.io"), DEMO_USER_NAME);
    }
}
