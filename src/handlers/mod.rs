// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod comments;
pub mod follow;
pub mod health;
pub mod messages;
pub mod notes;
pub mod notifications;
pub mod users;

pub use admin::config as admin_config;
pub use analytics::config as analytics_config;
pub use auth::config as auth_config;
pub use comments::config as comments_config;
pub use follow::config as follow_config;
pub use health::config as health_config;
pub use messages::config as messages_config;
pub use notes::config as notes_config;
pub use notifications::config as notifications_config;
pub use users::config as users_config;

use actix_web::web;

/// Every resource under /api
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth_config)
            .configure(users_config)
            .configure(notes_config)
            .configure(comments_config)
            .configure(follow_config)
            .configure(messages_config)
            .configure(notifications_config)
            .configure(analytics_config)
            .configure(admin_config),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::{FirestoreClient, NotesCache};
    use actix_web::{http::StatusCode, test, App};
    use sqlx::PgPool;
    use std::sync::Arc;

    // every request here is rejected before the pool is touched
    #[actix_rt::test]
    async fn test_api_routes_resolve_to_the_right_handlers() {
        let pool = PgPool::connect_lazy("postgresql://localhost/visiboard").unwrap();
        let mut cfg = Config::from_lookup(|_| None);
        cfg.admin_token = "secret".into();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(cfg))
                .app_data(web::Data::new(None::<FirestoreClient>))
                .app_data(web::Data::new(Arc::new(NotesCache::new(60))))
                .configure(health_config)
                .configure(api_config),
        )
        .await;

        let cases = [
            ("/api/notes/nearby?lat=100&lng=0", StatusCode::BAD_REQUEST),
            ("/api/notes/nearby?lat=0&lng=0&radius=-5", StatusCode::BAD_REQUEST),
            ("/api/notes/not-a-uuid", StatusCode::NOT_FOUND),
            ("/api/notifications/user/not-a-uuid", StatusCode::BAD_REQUEST),
            ("/api/notifications/user/not-a-uuid/unread-count", StatusCode::BAD_REQUEST),
            ("/api/admin/stats", StatusCode::UNAUTHORIZED),
            ("/api/health", StatusCode::NOT_FOUND),
        ];
        for (uri, expected) in cases {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "GET {}", uri);
        }
    }
}
