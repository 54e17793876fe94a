// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Simple endpoint to verify service status

use crate::config::Config;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn health_check(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "visiboard-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "firestore": config.firestore_enabled()
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn test_health_reports_ok() {
        let mut cfg = Config::from_lookup(|_| None);
        cfg.firestore_project_id.clear();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(cfg))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "visiboard-backend");
        assert_eq!(body["firestore"], false);
    }
}
