// src/models/comment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::UserResponse;

/// Comment on a note
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub note_id: Uuid,
    pub user_id: Uuid,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of POST /api/comments
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub note_id: Uuid,
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Comment DTO exposed via API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub note_id: Uuid,
    pub user: Option<UserResponse>,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn to_response(&self, user: Option<UserResponse>) -> CommentResponse {
        CommentResponse {
            id: self.id,
            note_id: self.note_id,
            user,
            content: self.content.clone(),
            created_at: self.created_at,
        }
    }
}
