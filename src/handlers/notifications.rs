// src/handlers/notifications.rs
// DOCUMENTATION: HTTP handlers for notifications

use crate::errors::BoardError;
use crate::models::CreateNotificationRequest;
use crate::services::NotificationService;
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// GET /api/notifications
pub async fn list_all(pool: web::Data<PgPool>) -> Result<impl Responder, BoardError> {
    let notifications = NotificationService::list_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// POST /api/notifications
pub async fn create(
    pool: web::Data<PgPool>,
    req: web::Json<CreateNotificationRequest>,
) -> Result<impl Responder, BoardError> {
    if let Err(e) = req.validate() {
        return Err(BoardError::ValidationError(e.to_string()));
    }

    let notification = NotificationService::create(pool.get_ref(), &req).await?;
    Ok(HttpResponse::Created().json(notification))
}

/// GET /api/notifications/user/{userId}
pub async fn list_for_user(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let user_id = NotificationService::parse_user_id(&path)?;
    let notifications = NotificationService::list_for_user(pool.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// GET /api/notifications/user/firebase/{uid}
pub async fn list_for_firebase_uid(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let notifications = NotificationService::list_for_firebase_uid(pool.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// GET /api/notifications/user/{userId}/unread-count
/// Body is the bare count
pub async fn unread_count(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let user_id = NotificationService::parse_user_id(&path)?;
    let count = NotificationService::unread_count(pool.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(count))
}

/// GET /api/notifications/{id}
pub async fn get(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BoardError> {
    let notification = NotificationService::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notification))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BoardError> {
    let notification = NotificationService::mark_read(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notification))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BoardError> {
    NotificationService::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_all))
            .route("", web::post().to(create))
            .route("/user/firebase/{uid}", web::get().to(list_for_firebase_uid))
            .route("/user/{user_id}/unread-count", web::get().to(unread_count))
            .route("/user/{user_id}", web::get().to(list_for_user))
            .route("/{id}", web::get().to(get))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/read", web::put().to(mark_read)),
    );
}
