// src/services/message_service.rs
// DOCUMENTATION: Direct messages between users addressed by Firebase uid

use crate::db::{MessageRepository, UserRepository};
use crate::errors::BoardError;
use crate::models::{Message, MessageResponse, NotificationKind, SendMessageRequest, SendMessageResponse};
use crate::services::{FirestoreClient, NotificationService, SyncService, UserService};
use sqlx::PgPool;
use uuid::Uuid;

/// Validated payload of a send request
#[derive(Debug, PartialEq)]
pub struct OutgoingMessage<'a> {
    pub from_uid: &'a str,
    pub to_uid: &'a str,
    pub text: &'a str,
    pub anonymous: bool,
}

impl<'a> OutgoingMessage<'a> {
    pub fn from_request(req: &'a SendMessageRequest) -> Result<Self, BoardError> {
        match (
            req.from_user_id.as_deref(),
            req.to_user_id.as_deref(),
            req.message_text.as_deref(),
        ) {
            (Some(from_uid), Some(to_uid), Some(text)) => Ok(Self {
                from_uid,
                to_uid,
                text,
                anonymous: req.is_anonymous.unwrap_or(false),
            }),
            _ => Err(BoardError::InvalidInput("Missing required fields".to_string())),
        }
    }
}

pub struct MessageService;

impl MessageService {
    pub async fn send(
        pool: &PgPool,
        firestore: Option<&FirestoreClient>,
        req: &SendMessageRequest,
    ) -> Result<SendMessageResponse, BoardError> {
        let out = OutgoingMessage::from_request(req)?;

        let sender = UserRepository::find_by_firebase_uid(pool, out.from_uid)
            .await?
            .ok_or_else(|| BoardError::InvalidInput("Sender not found".to_string()))?;
        let recipient = UserService::find_by_firebase_uid(pool, out.to_uid).await?;

        let message =
            MessageRepository::create(pool, sender.id, recipient.id, out.text, out.anonymous).await?;

        NotificationService::notify(pool, NotificationKind::Message, recipient.id, &sender, None).await;
        SyncService::send_message(firestore, &sender, out.to_uid, out.text, out.anonymous).await;

        Ok(SendMessageResponse {
            status: "success",
            message_id: message.id,
        })
    }

    async fn respond(pool: &PgPool, messages: Vec<Message>) -> Result<Vec<MessageResponse>, BoardError> {
        let ids: Vec<Uuid> = messages
            .iter()
            .flat_map(|m| [m.from_user_id, m.to_user_id])
            .collect();
        let users = UserService::map_by_id(pool, &ids).await?;
        Ok(messages
            .iter()
            .map(|m| m.to_response(users.get(&m.from_user_id), users.get(&m.to_user_id)))
            .collect())
    }

    pub async fn inbox(pool: &PgPool, uid: &str) -> Result<Vec<MessageResponse>, BoardError> {
        let user = UserService::find_by_firebase_uid(pool, uid).await?;
        let messages = MessageRepository::list_to_user(pool, user.id).await?;
        Self::respond(pool, messages).await
    }

    pub async fn sent(pool: &PgPool, uid: &str) -> Result<Vec<MessageResponse>, BoardError> {
        let user = UserService::find_by_firebase_uid(pool, uid).await?;
        let messages = MessageRepository::list_from_user(pool, user.id).await?;
        Self::respond(pool, messages).await
    }

    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<MessageResponse, BoardError> {
        let message = MessageRepository::mark_read(pool, id).await?;
        Ok(Self::respond(pool, vec![message]).await?.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(from: Option<&str>, to: Option<&str>, text: Option<&str>, anon: Option<bool>) -> SendMessageRequest {
        SendMessageRequest {
            from_user_id: from.map(String::from),
            to_user_id: to.map(String::from),
            message_text: text.map(String::from),
            is_anonymous: anon,
        }
    }

    #[test]
    fn test_missing_fields_rejected() {
        for r in [
            req(None, Some("b"), Some("hi"), None),
            req(Some("a"), None, Some("hi"), None),
            req(Some("a"), Some("b"), None, None),
        ] {
            match OutgoingMessage::from_request(&r) {
                Err(BoardError::InvalidInput(msg)) => assert_eq!(msg, "Missing required fields"),
                other => panic!("expected InvalidInput, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_anonymous_defaults_to_false() {
        let r = req(Some("a"), Some("b"), Some("hi"), None);
        let out = OutgoingMessage::from_request(&r).unwrap();
        assert!(!out.anonymous);

        let r = req(Some("a"), Some("b"), Some("hi"), Some(true));
        assert!(OutgoingMessage::from_request(&r).unwrap().anonymous);
    }
}
