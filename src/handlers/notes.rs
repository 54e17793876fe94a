// src/handlers/notes.rs
// DOCUMENTATION: HTTP handlers for note operations
// PURPOSE: Parse requests, call services, return responses

use crate::errors::BoardError;
use crate::models::{CreateNoteQuery, CreateNoteRequest, LikeQuery, NearbyQuery};
use crate::services::{FirestoreClient, NoteService, NotesCache};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// GET /api/notes
pub async fn list_notes(pool: web::Data<PgPool>) -> Result<impl Responder, BoardError> {
    let notes = NoteService::list_notes(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(notes))
}

/// POST /api/notes?userEmail=
pub async fn create_note(
    pool: web::Data<PgPool>,
    firestore: web::Data<Option<FirestoreClient>>,
    cache: web::Data<Arc<NotesCache>>,
    query: web::Query<CreateNoteQuery>,
    req: web::Json<CreateNoteRequest>,
) -> Result<impl Responder, BoardError> {
    let note = NoteService::create_note(
        pool.get_ref(),
        firestore.get_ref().as_ref(),
        cache.get_ref(),
        &req,
        query.user_email.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Created().json(note))
}

/// GET /api/notes/nearby?lat=&lng=&radius=
pub async fn nearby_notes(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<NotesCache>>,
    query: web::Query<NearbyQuery>,
) -> Result<impl Responder, BoardError> {
    let notes = NoteService::nearby(pool.get_ref(), cache.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(notes))
}

/// GET /api/notes/user/{userId}
pub async fn notes_by_user(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BoardError> {
    let notes = NoteService::notes_by_user(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notes))
}

/// GET /api/notes/{id}
pub async fn get_note(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BoardError> {
    let note = NoteService::get_note(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(note))
}

/// DELETE /api/notes/{id}
pub async fn delete_note(
    pool: web::Data<PgPool>,
    firestore: web::Data<Option<FirestoreClient>>,
    cache: web::Data<Arc<NotesCache>>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BoardError> {
    NoteService::delete_note(
        pool.get_ref(),
        firestore.get_ref().as_ref(),
        cache.get_ref(),
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/notes/{id}/like?userId=
/// Toggles: a second call by the same user removes the like
pub async fn toggle_like(
    pool: web::Data<PgPool>,
    firestore: web::Data<Option<FirestoreClient>>,
    cache: web::Data<Arc<NotesCache>>,
    path: web::Path<Uuid>,
    query: web::Query<LikeQuery>,
) -> Result<impl Responder, BoardError> {
    let note = NoteService::toggle_like(
        pool.get_ref(),
        firestore.get_ref().as_ref(),
        cache.get_ref(),
        path.into_inner(),
        query.user_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(note))
}

/// Configuration for note routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notes")
            .route("", web::get().to(list_notes))
            .route("", web::post().to(create_note))
            .route("/nearby", web::get().to(nearby_notes))
            .route("/user/{user_id}", web::get().to(notes_by_user))
            .route("/{id}", web::get().to(get_note))
            .route("/{id}", web::delete().to(delete_note))
            .route("/{id}/like", web::post().to(toggle_like)),
    );
}
