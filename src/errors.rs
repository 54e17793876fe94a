// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every failure a handler can surface
/// Each variant maps to an HTTP status code and a JSON error envelope
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden access")]
    Forbidden,

    #[error("Internal server error")]
    InternalError,

    #[error("Firestore error: {0}")]
    ExternalApiError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),
}

impl BoardError {
    fn code(&self) -> &'static str {
        match self {
            BoardError::NotFound(_) => "NOT_FOUND",
            BoardError::AlreadyExists(_) => "ALREADY_EXISTS",
            BoardError::DatabaseError(_) => "DATABASE_ERROR",
            BoardError::InvalidInput(_) => "INVALID_INPUT",
            BoardError::ValidationError(_) => "VALIDATION_ERROR",
            BoardError::Unauthorized(_) => "UNAUTHORIZED",
            BoardError::Forbidden => "FORBIDDEN",
            BoardError::InternalError => "INTERNAL_ERROR",
            BoardError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            BoardError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            BoardError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl From<sqlx::Error> for BoardError {
    fn from(e: sqlx::Error) -> Self {
        BoardError::DatabaseError(e.to_string())
    }
}

/// Convert BoardError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for BoardError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            BoardError::NotFound(_) => StatusCode::NOT_FOUND,
            BoardError::AlreadyExists(_) => StatusCode::CONFLICT,
            BoardError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BoardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BoardError::ValidationError(_) => StatusCode::BAD_REQUEST,
            BoardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BoardError::Forbidden => StatusCode::FORBIDDEN,
            BoardError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            BoardError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            BoardError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            BoardError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BoardError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BoardError::AlreadyExists("User already exists".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            BoardError::Unauthorized("Invalid credentials".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(BoardError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            BoardError::ExternalApiError("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            BoardError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_error_envelope() {
        let resp = BoardError::InvalidInput("Email is required".into()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = resp.into_body().try_into_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["code"], "INVALID_INPUT");
        assert_eq!(value["error"]["message"], "Email is required");
        assert!(value["error"]["timestamp"].is_string());
    }

    #[test]
    fn test_sqlx_error_maps_to_database_error() {
        let err: BoardError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, BoardError::DatabaseError(_)));
    }
}
