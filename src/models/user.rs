// src/models/user.rs
// DOCUMENTATION: User records, auth DTOs and public user view
// PURPOSE: Maps the users table; never exposes password hashes

use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::geo::optional_geojson_point;

/// Avatar style applied to accounts created through signup
pub const SIGNUP_AVATAR_STYLE: &str = "background=e94560&color=fff";

/// Avatar style for seeded and repaired accounts
pub const DEFAULT_AVATAR_STYLE: &str = "background=random";

pub const DEMO_USER_NAME: &str = "Demo User";
pub const DEMO_USER_EMAIL: &str = "demo@account.com";
pub const DEMO_USER_UID: &str = "demo_uid";

/// Row from the users table
/// last_location is read as ST_Y/ST_X into lat/lng
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub firebase_uid: Option<String>,
    pub profile_pic_url: Option<String>,
    pub current_tier: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub followers_count: i32,
    pub following_count: i32,
    pub total_likes_received: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert payload shared by signup, user creation, seeding and import
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub firebase_uid: Option<String>,
    pub profile_pic_url: Option<String>,
    pub current_tier: Option<String>,
    pub last_location: Option<Point<f64>>,
    /// Counters carried over from an imported profile
    pub followers_count: i32,
    pub following_count: i32,
}

/// Public user representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub firebase_uid: Option<String>,
    pub profile_pic_url: Option<String>,
    pub current_tier: Option<String>,
    pub followers_count: i32,
    pub following_count: i32,
    pub total_likes_received: i32,
    pub created_at: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Body of POST /api/users
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: String,

    pub firebase_uid: Option<String>,

    pub profile_pic_url: Option<String>,

    pub current_tier: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,

    /// GeoJSON alternative to lat/lng
    #[serde(default, with = "optional_geojson_point")]
    pub last_location: Option<Point<f64>>,
}

/// Body of POST /api/auth/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of POST /api/auth/signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl User {
    /// Convert User into the public API shape
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            firebase_uid: self.firebase_uid.clone(),
            profile_pic_url: self.profile_pic_url.clone(),
            current_tier: self.current_tier.clone(),
            followers_count: self.followers_count,
            following_count: self.following_count,
            total_likes_received: self.total_likes_received,
            created_at: self.created_at,
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// Name for display, falling back to the email local part
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => name_from_email(&self.email),
        }
    }

    /// Identifier used for this user in Firestore documents
    pub fn external_id(&self) -> String {
        self.firebase_uid
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Local part of an email address, or the whole string without '@'
pub fn name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// ui-avatars URL for a display name
pub fn avatar_url(name: &str, style: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&{}",
        name.replace(' ', "+"),
        style
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.map(String::from),
            email: email.to_string(),
            password_hash: Some("$argon2id$secret".into()),
            firebase_uid: None,
            profile_pic_url: None,
            current_tier: None,
            lat: None,
            lng: None,
            followers_count: 0,
            following_count: 0,
            total_likes_received: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_avatar_url_replaces_spaces() {
        assert_eq!(
            avatar_url("Demo User", DEFAULT_AVATAR_STYLE),
            "https://ui-avatars.com/api/?name=Demo+User&background=random"
        );
        assert_eq!(
            avatar_url("ana", SIGNUP_AVATAR_STYLE),
            "https://ui-avatars.com/api/?name=ana&background=e94560&color=fff"
        );
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(user(Some("Ana"), "ana@x.io").display_name(), "Ana");
        assert_eq!(user(Some(""), "bob@x.io").display_name(), "bob");
        assert_eq!(user(None, "carl@x.io").display_name(), "carl");
    }

    #[test]
    fn test_response_hides_password_hash() {
        let value = serde_json::to_value(user(Some("Ana"), "ana@x.io").to_response()).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "ana@x.io");
        assert!(value.get("followersCount").is_some());
    }

    #[test]
    fn test_external_id_prefers_firebase_uid() {
        let mut u = user(None, "a@b.c");
        assert_eq!(u.external_id(), u.id.to_string());
        u.firebase_uid = Some("uid-1".into());
        assert_eq!(u.external_id(), "uid-1");
    }
}
