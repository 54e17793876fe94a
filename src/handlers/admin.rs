// src/handlers/admin.rs
// DOCUMENTATION: Admin handlers for Firestore import and store statistics
// PURPOSE: Expose sync functionality via REST endpoints

use crate::config::Config;
use crate::db::{CommentRepository, DeletedNoteRepository, NoteRepository, UserRepository};
use crate::errors::BoardError;
use crate::services::{CacheStats, FirestoreClient, NotesCache, SyncService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

/// Response for stats endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatsResponse {
    pub users: i64,
    pub notes: i64,
    pub comments: i64,
    /// Deleted notes kept out of future imports
    pub tombstones: i64,
    pub firestore_enabled: bool,
    pub cache: CacheStats,
}

/// POST /api/admin/sync
/// Replace local data with a full Firestore import
///
/// DOCUMENTATION: Requires admin authentication via X-Admin-Token header
pub async fn sync_from_firestore(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    firestore: web::Data<Option<FirestoreClient>>,
    cache: web::Data<Arc<NotesCache>>,
    req: HttpRequest,
) -> Result<impl Responder, BoardError> {
    verify_admin_token(&req, &config)?;

    let client = firestore.get_ref().as_ref().ok_or_else(|| {
        BoardError::ServiceUnavailable("Firestore is not configured".to_string())
    })?;

    log::info!("Admin sync requested for project {}", client.project_id());

    let stats = SyncService::sync_from_firestore(pool.get_ref(), client).await?;
    cache.clear().await;

    log::info!(
        "Sync completed: {} users, {} notes ({} skipped), {} comments, {} errors",
        stats.users_imported,
        stats.notes_imported,
        stats.notes_skipped,
        stats.comments_imported,
        stats.errors.len()
    );

    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/admin/stats
pub async fn store_stats(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    cache: web::Data<Arc<NotesCache>>,
    req: HttpRequest,
) -> Result<impl Responder, BoardError> {
    verify_admin_token(&req, &config)?;

    let pool = pool.get_ref();
    let response = StoreStatsResponse {
        users: UserRepository::count(pool).await?,
        notes: NoteRepository::count(pool).await?,
        comments: CommentRepository::count(pool).await?,
        tombstones: DeletedNoteRepository::count(pool).await?,
        firestore_enabled: config.firestore_enabled(),
        cache: cache.stats().await,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Helper function to verify admin authentication
/// DOCUMENTATION: Checks X-Admin-Token header against configured admin token
fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), BoardError> {
    let token = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Admin request without token");
            BoardError::Unauthorized("Missing X-Admin-Token header".to_string())
        })?;

    if token != config.admin_token {
        log::warn!("Admin request with invalid token");
        return Err(BoardError::Forbidden);
    }

    Ok(())
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/sync", web::post().to(sync_from_firestore))
            .route("/stats", web::get().to(store_stats)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test as actix_test, App, ResponseError};

    fn config_with_token(token: &str) -> Config {
        let mut cfg = Config::from_lookup(|_| None);
        cfg.admin_token = token.to_string();
        cfg
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let req = actix_test::TestRequest::default().to_http_request();
        let err = verify_admin_token(&req, &config_with_token("secret")).unwrap_err();
        assert!(matches!(&err, BoardError::Unauthorized(msg) if msg.contains("X-Admin-Token")));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_wrong_token_is_forbidden() {
        let req = actix_test::TestRequest::default()
            .insert_header(("X-Admin-Token", "guess"))
            .to_http_request();
        let err = verify_admin_token(&req, &config_with_token("secret")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_matching_token_passes() {
        let req = actix_test::TestRequest::default()
            .insert_header(("X-Admin-Token", "secret"))
            .to_http_request();
        assert!(verify_admin_token(&req, &config_with_token("secret")).is_ok());
    }

    #[actix_rt::test]
    async fn test_sync_without_firestore_is_unavailable() {
        // lazy pool: never connects because the request fails before any query
        let pool = PgPool::connect_lazy("postgresql://localhost/visiboard").unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(config_with_token("secret")))
                .app_data(web::Data::new(None::<FirestoreClient>))
                .app_data(web::Data::new(Arc::new(NotesCache::new(60))))
                .configure(config),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/admin/sync")
            .insert_header(("X-Admin-Token", "secret"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let req = actix_test::TestRequest::get().uri("/admin/stats").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
