// src/models/follow.rs

use serde::Serialize;

/// Response of GET /api/follow/check
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowCheckResponse {
    pub is_following: bool,
}
