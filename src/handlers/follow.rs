// src/handlers/follow.rs
// DOCUMENTATION: Follow graph endpoints, users addressed by Firebase uid

use crate::errors::BoardError;
use crate::models::FollowCheckResponse;
use crate::services::{FirestoreClient, FollowService};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;

/// POST /api/follow/{followerUid}/{targetUid}
pub async fn follow(
    pool: web::Data<PgPool>,
    firestore: web::Data<Option<FirestoreClient>>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, BoardError> {
    let (follower, target) = path.into_inner();
    FollowService::follow(pool.get_ref(), firestore.get_ref().as_ref(), &follower, &target).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Followed successfully" })))
}

/// POST /api/follow/unfollow/{followerUid}/{targetUid}
pub async fn unfollow(
    pool: web::Data<PgPool>,
    firestore: web::Data<Option<FirestoreClient>>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, BoardError> {
    let (follower, target) = path.into_inner();
    FollowService::unfollow(pool.get_ref(), firestore.get_ref().as_ref(), &follower, &target).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Unfollowed successfully" })))
}

/// GET /api/follow/check/{followerUid}/{targetUid}
pub async fn check(
    pool: web::Data<PgPool>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, BoardError> {
    let (follower, target) = path.into_inner();
    let is_following = FollowService::is_following(pool.get_ref(), &follower, &target).await?;
    Ok(HttpResponse::Ok().json(FollowCheckResponse { is_following }))
}

/// GET /api/follow/followers/{uid}
pub async fn followers(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let users = FollowService::followers(pool.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/follow/following/{uid}
pub async fn following(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, BoardError> {
    let users = FollowService::following(pool.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(users))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/follow")
            .route("/unfollow/{follower}/{target}", web::post().to(unfollow))
            .route("/check/{follower}/{target}", web::get().to(check))
            .route("/followers/{uid}", web::get().to(followers))
            .route("/following/{uid}", web::get().to(following))
            .route("/{follower}/{target}", web::post().to(follow)),
    );
}
