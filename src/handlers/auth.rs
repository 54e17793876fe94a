// src/handlers/auth.rs
// DOCUMENTATION: Login and signup endpoints

use crate::config::Config;
use crate::errors::BoardError;
use crate::models::{LoginRequest, SignupRequest};
use crate::services::AuthService;
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;

/// POST /api/auth/login
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: web::Json<LoginRequest>,
) -> Result<impl Responder, BoardError> {
    let user = AuthService::login(pool.get_ref(), &req, config.allow_legacy_login).await?;
    Ok(HttpResponse::Ok().json(user.to_response()))
}

/// POST /api/auth/signup
pub async fn signup(
    pool: web::Data<PgPool>,
    req: web::Json<SignupRequest>,
) -> Result<impl Responder, BoardError> {
    let user = AuthService::signup(pool.get_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(user.to_response()))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/signup", web::post().to(signup)),
    );
}
