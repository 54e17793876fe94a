// src/services/user_service.rs
// DOCUMENTATION: User lookups shared by every resource that embeds users

use crate::db::UserRepository;
use crate::errors::BoardError;
use crate::models::geo::{point_from_lat_lng, validate_lat_lng};
use crate::models::{CreateUserRequest, NewUser, User};
use crate::services::{FirestoreClient, SyncService};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

pub struct UserService;

impl UserService {
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, BoardError> {
        UserRepository::list_all(pool).await
    }

    /// Create a user and mirror it to users/{firebaseUid}
    pub async fn create(
        pool: &PgPool,
        firestore: Option<&FirestoreClient>,
        req: &CreateUserRequest,
    ) -> Result<User, BoardError> {
        let last_location = match (req.lat, req.lng) {
            (Some(lat), Some(lng)) => {
                validate_lat_lng(lat, lng)?;
                Some(point_from_lat_lng(lat, lng))
            }
            (None, None) => req.last_location,
            _ => {
                return Err(BoardError::ValidationError(
                    "lat and lng must be provided together".to_string(),
                ))
            }
        };

        let new_user = NewUser {
            name: req.name.clone(),
            email: req.email.trim().to_string(),
            password_hash: None,
            firebase_uid: req.firebase_uid.clone(),
            profile_pic_url: req.profile_pic_url.clone(),
            current_tier: req.current_tier.clone(),
            last_location,
            ..Default::default()
        };

        let user = UserRepository::create(pool, &new_user).await?;
        if user.firebase_uid.is_some() {
            SyncService::sync_user(firestore, &user).await;
        }
        Ok(user)
    }

    /// Resolve a path segment that is either a UUID or an email
    pub async fn find_by_id_or_email(pool: &PgPool, key: &str) -> Result<User, BoardError> {
        let found = match Uuid::parse_str(key) {
            Ok(id) => UserRepository::find_by_id(pool, id).await?,
            Err(_) => UserRepository::find_by_email(pool, key).await?,
        };
        found.ok_or_else(|| {
            log::warn!("User not found: {}", key);
            BoardError::NotFound(format!("User {}", key))
        })
    }

    pub async fn find_by_firebase_uid(pool: &PgPool, uid: &str) -> Result<User, BoardError> {
        UserRepository::find_by_firebase_uid(pool, uid)
            .await?
            .ok_or_else(|| {
                log::warn!("User not found for firebase uid {}", uid);
                BoardError::NotFound(format!("User {}", uid))
            })
    }

    /// Load users by id into a lookup map
    pub async fn map_by_id(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, User>, BoardError> {
        let mut unique: Vec<Uuid> = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let users = UserRepository::find_many(pool, &unique).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Acting user: the given id, else the oldest account
    pub async fn given_or_first(pool: &PgPool, user_id: Option<Uuid>) -> Result<User, BoardError> {
        match user_id {
            Some(id) => UserRepository::find_by_id(pool, id)
                .await?
                .ok_or_else(|| BoardError::NotFound(format!("User {}", id))),
            None => UserRepository::find_first(pool)
                .await?
                .ok_or_else(|| BoardError::NotFound("No users found".to_string())),
        }
    }
}
