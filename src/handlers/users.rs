// src/handlers/users.rs
// DOCUMENTATION: HTTP handlers for user operations

use crate::errors::BoardError;
use crate::models::{CreateUserRequest, User, UserResponse};
use crate::services::{FirestoreClient, UserService};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// GET /api/users
pub async fn list_users(pool: web::Data<PgPool>) -> Result<impl Responder, BoardError> {
    let users: Vec<UserResponse> = UserService::list(pool.get_ref())
        .await?
        .iter()
        .map(User::to_response)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// POST /api/users
pub async fn create_user(
    pool: web::Data<PgPool>,
    firestore: web::Data<Option<FirestoreClient>>,
    req: web::Json<CreateUserRequest>,
) -> Result<impl Responder, BoardError> {
    if let Err(e) = req.validate() {
        return Err(BoardError::ValidationError(e.to_string()));
    }

    let user = UserService::create(pool.get_ref(), firestore.get_ref().as_ref(), &req).await?;
    Ok(HttpResponse::Created().json(user.to_response()))
}

/// GET /api/users/firebase/{uid}
pub async fn get_by_firebase_uid(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let user = UserService::find_by_firebase_uid(pool.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(user.to_response()))
}

/// GET /api/users/{idOrEmail}
pub async fn get_user(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let user = UserService::find_by_id_or_email(pool.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(user.to_response()))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/firebase/{uid}", web::get().to(get_by_firebase_uid))
            .route("/{id}", web::get().to(get_user)),
    );
}
