// src/models/note.rs
// DOCUMENTATION: Core data structures for geotagged notes
// PURPOSE: Database rows, request DTOs and API responses for notes and likes

use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::geo::{optional_geojson_point, point_from_lat_lng, validate_lat_lng};
use super::UserResponse;
use crate::errors::BoardError;

/// Default radius for nearby queries, in meters
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 1000.0;

/// Largest radius a nearby query may ask for, in meters
pub const MAX_NEARBY_RADIUS_M: f64 = 50_000.0;

/// Represents a note record from the database
/// DOCUMENTATION: location is extracted with ST_Y/ST_X into lat/lng
#[derive(Debug, Clone, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub firebase_id: Option<String>,
    pub user_id: Uuid,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub image_base64: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
}

/// Insert payload used by note creation and Firestore import
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub user_id: Uuid,
    pub firebase_id: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub location: Option<Point<f64>>,
    /// None lets the database stamp NOW()
    pub created_at: Option<DateTime<Utc>>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub image_base64: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
}

/// Request DTO for creating a note
/// DOCUMENTATION: Body of POST /api/notes
/// Location may be given as lat/lng or as a GeoJSON point
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,

    pub summary: Option<String>,

    pub lat: Option<f64>,

    pub lng: Option<f64>,

    #[serde(default, with = "optional_geojson_point")]
    pub location: Option<Point<f64>>,

    pub firebase_id: Option<String>,

    pub image_base64: Option<String>,

    #[validate(range(min = 0))]
    pub image_width: Option<i32>,

    #[validate(range(min = 0))]
    pub image_height: Option<i32>,
}

impl CreateNoteRequest {
    /// Resolve the note's point: lat/lng win over GeoJSON
    pub fn resolve_location(&self) -> Result<Option<Point<f64>>, BoardError> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                validate_lat_lng(lat, lng)?;
                Ok(Some(point_from_lat_lng(lat, lng)))
            }
            (None, None) => match self.location {
                Some(point) => {
                    validate_lat_lng(point.y(), point.x())?;
                    Ok(Some(point))
                }
                None => Ok(None),
            },
            _ => Err(BoardError::ValidationError(
                "lat and lng must be provided together".to_string(),
            )),
        }
    }
}

/// Query string of POST /api/notes
#[derive(Debug, Deserialize)]
pub struct CreateNoteQuery {
    #[serde(rename = "userEmail")]
    pub user_email: Option<String>,
}

/// Query string of POST /api/notes/{id}/like
#[derive(Debug, Deserialize)]
pub struct LikeQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
}

/// Query string of GET /api/notes/nearby
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    /// Radius in meters
    pub radius: Option<f64>,
}

impl NearbyQuery {
    /// Validated radius in meters
    pub fn radius_m(&self) -> Result<f64, BoardError> {
        let radius = self.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_M);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(BoardError::ValidationError(
                "radius must be positive".to_string(),
            ));
        }
        Ok(radius.min(MAX_NEARBY_RADIUS_M))
    }
}

/// Response DTO for notes
/// DOCUMENTATION: Owner embedded, likers listed by their external id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub firebase_id: Option<String>,
    pub user: Option<UserResponse>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Same point as lat/lng, as a GeoJSON geometry
    #[serde(default, with = "optional_geojson_point")]
    pub location: Option<Point<f64>>,
    pub created_at: DateTime<Utc>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub liked_by_users: Vec<String>,
    pub image_base64: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
}

impl Note {
    /// Convert Note to NoteResponse for API
    pub fn to_response(&self, user: Option<UserResponse>, liked_by_users: Vec<String>) -> NoteResponse {
        NoteResponse {
            id: self.id,
            firebase_id: self.firebase_id.clone(),
            user,
            content: self.content.clone(),
            summary: self.summary.clone(),
            lat: self.lat,
            lng: self.lng,
            location: match (self.lat, self.lng) {
                (Some(lat), Some(lng)) => Some(point_from_lat_lng(lat, lng)),
                _ => None,
            },
            created_at: self.created_at,
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            liked_by_users,
            image_base64: self.image_base64.clone(),
            image_width: self.image_width,
            image_height: self.image_height,
        }
    }

    /// Document id this note has in Firestore
    pub fn external_id(&self) -> String {
        match self.firebase_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> CreateNoteRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_lat_lng_take_precedence() {
        let req = request(json!({
            "content": "hello",
            "lat": 1.5,
            "lng": 2.5,
            "location": {"type": "Point", "coordinates": [9.0, 9.0]}
        }));
        let p = req.resolve_location().unwrap().unwrap();
        assert_eq!((p.x(), p.y()), (2.5, 1.5));
    }

    #[test]
    fn test_geojson_location_fallback() {
        let req = request(json!({
            "content": "hello",
            "location": {"type": "Point", "coordinates": [-3.7, 40.4]}
        }));
        let p = req.resolve_location().unwrap().unwrap();
        assert_eq!((p.x(), p.y()), (-3.7, 40.4));
    }

    #[test]
    fn test_half_a_coordinate_is_rejected() {
        let req = request(json!({"content": "hello", "lat": 1.0}));
        assert!(matches!(
            req.resolve_location(),
            Err(BoardError::ValidationError(_))
        ));
    }

    #[test]
    fn test_no_location_is_allowed() {
        let req = request(json!({"content": "hello"}));
        assert!(req.resolve_location().unwrap().is_none());
    }

    #[test]
    fn test_empty_content_fails_validation() {
        let req = request(json!({"content": ""}));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_nearby_radius_defaults_and_caps() {
        let q = NearbyQuery { lat: 0.0, lng: 0.0, radius: None };
        assert_eq!(q.radius_m().unwrap(), DEFAULT_NEARBY_RADIUS_M);

        let q = NearbyQuery { lat: 0.0, lng: 0.0, radius: Some(1e9) };
        assert_eq!(q.radius_m().unwrap(), MAX_NEARBY_RADIUS_M);

        let q = NearbyQuery { lat: 0.0, lng: 0.0, radius: Some(-1.0) };
        assert!(q.radius_m().is_err());
    }

    #[test]
    fn test_external_id_falls_back_to_uuid() {
        let mut note = Note {
            id: Uuid::new_v4(),
            firebase_id: None,
            user_id: Uuid::new_v4(),
            content: Some("x".into()),
            summary: None,
            lat: None,
            lng: None,
            created_at: Utc::now(),
            likes_count: 0,
            comments_count: 0,
            image_base64: None,
            image_width: None,
            image_height: None,
        };
        assert_eq!(note.external_id(), note.id.to_string());

        note.firebase_id = Some(String::new());
        assert_eq!(note.external_id(), note.id.to_string());

        note.firebase_id = Some("fs-doc".into());
        assert_eq!(note.external_id(), "fs-doc");
    }

    #[test]
    fn test_response_is_camel_case() {
        let note = Note {
            id: Uuid::new_v4(),
            firebase_id: None,
            user_id: Uuid::new_v4(),
            content: Some("x".into()),
            summary: None,
            lat: Some(1.0),
            lng: Some(2.0),
            created_at: Utc::now(),
            likes_count: 3,
            comments_count: 1,
            image_base64: None,
            image_width: None,
            image_height: None,
        };
        let value = serde_json::to_value(note.to_response(None, vec!["uid".into()])).unwrap();
        assert_eq!(value["likesCount"], 3);
        assert_eq!(value["likedByUsers"], json!(["uid"]));
        assert_eq!(value["lat"], 1.0);
        assert_eq!(value["lng"], 2.0);
        assert_eq!(value["location"]["type"], "Point");
        assert_eq!(value["location"]["coordinates"], json!([2.0, 1.0]));

        let back: NoteResponse = serde_json::from_value(value).unwrap();
        let p = back.location.unwrap();
        assert_eq!((p.x(), p.y()), (2.0, 1.0));
    }
}
