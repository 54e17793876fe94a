// src/services/follow_service.rs
// DOCUMENTATION: Follow graph addressed by Firebase uid

use crate::db::FollowRepository;
use crate::errors::BoardError;
use crate::models::{NotificationKind, User, UserResponse};
use crate::services::{FirestoreClient, NotificationService, SyncService, UserService};
use sqlx::PgPool;

pub struct FollowService;

impl FollowService {
    pub async fn follow(
        pool: &PgPool,
        firestore: Option<&FirestoreClient>,
        follower_uid: &str,
        target_uid: &str,
    ) -> Result<(), BoardError> {
        if follower_uid == target_uid {
            return Err(BoardError::InvalidInput("Cannot follow yourself".to_string()));
        }
        let follower = UserService::find_by_firebase_uid(pool, follower_uid).await?;
        let target = UserService::find_by_firebase_uid(pool, target_uid).await?;

        if !FollowRepository::create(pool, follower.id, target.id).await? {
            log::debug!("{} already follows {}", follower_uid, target_uid);
            return Ok(());
        }

        NotificationService::notify(pool, NotificationKind::Follow, target.id, &follower, None).await;
        SyncService::write_follow(firestore, &follower, &target, true).await;

        log::info!("{} followed {}", follower_uid, target_uid);
        Ok(())
    }

    pub async fn unfollow(
        pool: &PgPool,
        firestore: Option<&FirestoreClient>,
        follower_uid: &str,
        target_uid: &str,
    ) -> Result<(), BoardError> {
        let follower = UserService::find_by_firebase_uid(pool, follower_uid).await?;
        let target = UserService::find_by_firebase_uid(pool, target_uid).await?;

        if FollowRepository::delete(pool, follower.id, target.id).await? {
            SyncService::write_follow(firestore, &follower, &target, false).await;
            log::info!("{} unfollowed {}", follower_uid, target_uid);
        }
        Ok(())
    }

    /// Unknown uids are simply not following
    pub async fn is_following(pool: &PgPool, follower_uid: &str, target_uid: &str) -> Result<bool, BoardError> {
        let (follower, target) = match (
            UserService::find_by_firebase_uid(pool, follower_uid).await,
            UserService::find_by_firebase_uid(pool, target_uid).await,
        ) {
            (Ok(f), Ok(t)) => (f, t),
            (Err(BoardError::NotFound(_)), _) | (_, Err(BoardError::NotFound(_))) => return Ok(false),
            (Err(e), _) | (_, Err(e)) => return Err(e),
        };
        FollowRepository::exists(pool, follower.id, target.id).await
    }

    pub async fn followers(pool: &PgPool, uid: &str) -> Result<Vec<UserResponse>, BoardError> {
        let user = UserService::find_by_firebase_uid(pool, uid).await?;
        let users = FollowRepository::followers_of(pool, user.id).await?;
        Ok(users.iter().map(User::to_response).collect())
    }

    pub async fn following(pool: &PgPool, uid: &str) -> Result<Vec<UserResponse>, BoardError> {
        let user = UserService::find_by_firebase_uid(pool, uid).await?;
        let users = FollowRepository::following_of(pool, user.id).await?;
        Ok(users.iter().map(User::to_response).collect())
    }
}
