// src/models/message.rs
// DOCUMENTATION: Direct messages between users, optionally anonymous

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::User;

/// Sender name shown for anonymous messages
pub const ANONYMOUS_SENDER: &str = "Anonymous";

/// Row from messages
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub text: Option<String>,
    pub is_anonymous: bool,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of POST /api/messages/send
/// Users are addressed by their external (Firebase) id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
    pub message_text: Option<String>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub status: &'static str,
    pub message_id: Uuid,
}

/// Message DTO; sender identity is masked when anonymous
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub from_user_id: Option<String>,
    pub from_user_name: String,
    pub from_user_profile_pic: Option<String>,
    pub to_user_id: Option<String>,
    pub message_text: Option<String>,
    #[serde(rename = "anonymous")]
    pub is_anonymous: bool,
    #[serde(rename = "read")]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Sender name and picture as the recipient should see them
pub fn visible_sender(sender: Option<&User>, anonymous: bool) -> (String, Option<String>) {
    if anonymous {
        return (ANONYMOUS_SENDER.to_string(), None);
    }
    match sender {
        Some(user) => (user.display_name(), user.profile_pic_url.clone()),
        None => ("Unknown".to_string(), None),
    }
}

impl Message {
    pub fn to_response(&self, sender: Option<&User>, recipient: Option<&User>) -> MessageResponse {
        let (from_user_name, from_user_profile_pic) = visible_sender(sender, self.is_anonymous);
        MessageResponse {
            id: self.id,
            from_user_id: if self.is_anonymous {
                None
            } else {
                sender.map(|u| u.external_id())
            },
            from_user_name,
            from_user_profile_pic,
            to_user_id: recipient.map(|u| u.external_id()),
            message_text: self.text.clone(),
            is_anonymous: self.is_anonymous,
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> User {
        User {
            id: Uuid::new_v4(),
            name: Some("Ana".into()),
            email: "ana@x.io".into(),
            password_hash: None,
            firebase_uid: Some("uid-ana".into()),
            profile_pic_url: Some("https://pics/ana.png".into()),
            current_tier: None,
            lat: None,
            lng: None,
            followers_count: 0,
            following_count: 0,
            total_likes_received: 0,
            created_at: Utc::now(),
        }
    }

    fn message(anonymous: bool) -> Message {
        Message {
            id: Uuid::new_v4(),
            from_user_id: Uuid::new_v4(),
            to_user_id: Uuid::new_v4(),
            text: Some("hi".into()),
            is_anonymous: anonymous,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_anonymous_message_hides_sender() {
        let s = sender();
        let resp = message(true).to_response(Some(&s), None);
        assert_eq!(resp.from_user_name, ANONYMOUS_SENDER);
        assert!(resp.from_user_profile_pic.is_none());
        assert!(resp.from_user_id.is_none());
    }

    #[test]
    fn test_named_message_shows_sender() {
        let s = sender();
        let resp = message(false).to_response(Some(&s), None);
        assert_eq!(resp.from_user_name, "Ana");
        assert_eq!(resp.from_user_id.as_deref(), Some("uid-ana"));
        assert_eq!(resp.from_user_profile_pic.as_deref(), Some("https://pics/ana.png"));
    }
}
