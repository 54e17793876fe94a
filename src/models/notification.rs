// src/models/notification.rs
// DOCUMENTATION: Notifications produced by likes, comments, follows and messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::UserResponse;

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Message,
}

impl NotificationKind {
    /// Stored type string; "message" is lowercase to match the mobile client
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "LIKE",
            NotificationKind::Comment => "COMMENT",
            NotificationKind::Follow => "FOLLOW",
            NotificationKind::Message => "message",
        }
    }

    /// Human-readable text shown to the recipient
    pub fn describe(&self, sender_name: &str) -> String {
        match self {
            NotificationKind::Like => format!("{} liked your note", sender_name),
            NotificationKind::Comment => format!("{} commented on your note", sender_name),
            NotificationKind::Follow => format!("{} started following you", sender_name),
            NotificationKind::Message => format!("{} sent you a message", sender_name),
        }
    }
}

/// Row from notifications
#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub note_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    pub type_field: String,
    pub message: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for notifications
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub note_id: Option<Uuid>,
    pub type_field: String,
    pub message: Option<String>,
}

/// Body of POST /api/notifications
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub note_id: Option<Uuid>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 32))]
    pub type_: String,
    pub message: Option<String>,
}

/// Notification DTO for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub recipient: Option<UserResponse>,
    pub sender: Option<UserResponse>,
    pub note_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub type_: String,
    pub message: Option<String>,
    #[serde(rename = "read")]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn to_response(
        &self,
        recipient: Option<UserResponse>,
        sender: Option<UserResponse>,
    ) -> NotificationResponse {
        NotificationResponse {
            id: self.id,
            recipient,
            sender,
            note_id: self.note_id,
            type_: self.type_field.clone(),
            message: self.message.clone(),
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(NotificationKind::Like.as_str(), "LIKE");
        assert_eq!(NotificationKind::Comment.as_str(), "COMMENT");
        assert_eq!(NotificationKind::Follow.as_str(), "FOLLOW");
        assert_eq!(NotificationKind::Message.as_str(), "message");
    }

    #[test]
    fn test_read_flag_serializes_as_read() {
        let n = Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            note_id: None,
            type_field: "LIKE".into(),
            message: Some(NotificationKind::Like.describe("Ana")),
            is_read: true,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(n.to_response(None, None)).unwrap();
        assert_eq!(value["read"], true);
        assert_eq!(value["type"], "LIKE");
        assert_eq!(value["message"], "Ana liked your note");
    }
}
