// src/handlers/messages.rs

use crate::errors::BoardError;
use crate::models::SendMessageRequest;
use crate::services::{FirestoreClient, MessageService};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;

/// POST /api/messages/send
pub async fn send(
    pool: web::Data<PgPool>,
    firestore: web::Data<Option<FirestoreClient>>,
    req: web::Json<SendMessageRequest>,
) -> Result<impl Responder, BoardError> {
    let sent = MessageService::send(pool.get_ref(), firestore.get_ref().as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(sent))
}

/// GET /api/messages/inbox/{uid}
pub async fn inbox(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let messages = MessageService::inbox(pool.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// GET /api/messages/sent/{uid}
pub async fn sent(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let messages = MessageService::sent(pool.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// PUT /api/messages/{id}/read
pub async fn mark_read(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BoardError> {
    let message = MessageService::mark_read(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/messages")
            .route("/send", web::post().to(send))
            .route("/inbox/{uid}", web::get().to(inbox))
            .route("/sent/{uid}", web::get().to(sent))
            .route("/{id}/read", web::put().to(mark_read)),
    );
}
