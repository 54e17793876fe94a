// src/handlers/comments.rs

use crate::errors::BoardError;
use crate::models::CreateCommentRequest;
use crate::services::{CommentService, FirestoreClient, NotesCache};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// GET /api/comments/note/{noteId}
pub async fn list_for_note(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BoardError> {
    let comments = CommentService::list_for_note(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// POST /api/comments
pub async fn add_comment(
    pool: web::Data<PgPool>,
    firestore: web::Data<Option<FirestoreClient>>,
    cache: web::Data<Arc<NotesCache>>,
    req: web::Json<CreateCommentRequest>,
) -> Result<impl Responder, BoardError> {
    let comment = CommentService::add_comment(
        pool.get_ref(),
        firestore.get_ref().as_ref(),
        cache.get_ref(),
        &req,
    )
    .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/comments")
            .route("", web::post().to(add_comment))
            .route("/note/{note_id}", web::get().to(list_for_note)),
    );
}
