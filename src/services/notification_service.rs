// src/services/notification_service.rs
// DOCUMENTATION: Notification listing and creation

use crate::db::{NotificationRepository, UserRepository};
use crate::errors::BoardError;
use crate::models::{
    CreateNotificationRequest, NewNotification, Notification, NotificationKind,
    NotificationResponse, User,
};
use crate::services::UserService;
use sqlx::PgPool;
use uuid::Uuid;

pub struct NotificationService;

impl NotificationService {
    async fn hydrate(
        pool: &PgPool,
        notifications: Vec<Notification>,
    ) -> Result<Vec<NotificationResponse>, BoardError> {
        let ids: Vec<Uuid> = notifications
            .iter()
            .flat_map(|n| [n.recipient_id, n.sender_id])
            .collect();
        let users = UserService::map_by_id(pool, &ids).await?;

        Ok(notifications
            .iter()
            .map(|n| {
                n.to_response(
                    users.get(&n.recipient_id).map(User::to_response),
                    users.get(&n.sender_id).map(User::to_response),
                )
            })
            .collect())
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<NotificationResponse>, BoardError> {
        let all = NotificationRepository::list_all(pool).await?;
        Self::hydrate(pool, all).await
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<NotificationResponse, BoardError> {
        let n = NotificationRepository::get(pool, id).await?;
        Ok(Self::hydrate(pool, vec![n]).await?.remove(0))
    }

    /// Parse a recipient path segment; anything but a UUID is a 400
    pub fn parse_user_id(raw: &str) -> Result<Uuid, BoardError> {
        Uuid::parse_str(raw)
            .map_err(|_| BoardError::InvalidInput(format!("Invalid user id: {}", raw)))
    }

    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<NotificationResponse>, BoardError> {
        let list = NotificationRepository::list_by_recipient(pool, user_id).await?;
        Self::hydrate(pool, list).await
    }

    /// Unknown uids simply have no notifications
    pub async fn list_for_firebase_uid(pool: &PgPool, uid: &str) -> Result<Vec<NotificationResponse>, BoardError> {
        match UserRepository::find_by_firebase_uid(pool, uid).await? {
            Some(user) => Self::list_for_user(pool, user.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<NotificationResponse, BoardError> {
        let n = NotificationRepository::mark_read(pool, id).await?;
        Ok(Self::hydrate(pool, vec![n]).await?.remove(0))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), BoardError> {
        NotificationRepository::delete(pool, id).await
    }

    pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, BoardError> {
        NotificationRepository::unread_count(pool, user_id).await
    }

    pub async fn create(pool: &PgPool, req: &CreateNotificationRequest) -> Result<NotificationResponse, BoardError> {
        for id in [req.recipient_id, req.sender_id] {
            if UserRepository::find_by_id(pool, id).await?.is_none() {
                return Err(BoardError::NotFound(format!("User {}", id)));
            }
        }
        let created = NotificationRepository::create(
            pool,
            &NewNotification {
                recipient_id: req.recipient_id,
                sender_id: req.sender_id,
                note_id: req.note_id,
                type_field: req.type_.clone(),
                message: req.message.clone(),
            },
        )
        .await?;
        Ok(Self::hydrate(pool, vec![created]).await?.remove(0))
    }

    /// Record an activity notification; self-actions are ignored
    /// DOCUMENTATION: Failures are logged, never surfaced to the caller
    pub async fn notify(
        pool: &PgPool,
        kind: NotificationKind,
        recipient_id: Uuid,
        sender: &User,
        note_id: Option<Uuid>,
    ) {
        if recipient_id == sender.id {
            return;
        }
        let n = NewNotification {
            recipient_id,
            sender_id: sender.id,
            note_id,
            type_field: kind.as_str().to_string(),
            message: Some(kind.describe(&sender.display_name())),
        };
        if let Err(e) = NotificationRepository::create(pool, &n).await {
            log::warn!("Failed to record {} notification: {}", kind.as_str(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        let id = Uuid::new_v4();
        assert_eq!(NotificationService::parse_user_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            NotificationService::parse_user_id("not-a-uuid"),
            Err(BoardError::InvalidInput(_))
        ));
    }
}
