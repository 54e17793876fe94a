// src/handlers/analytics.rs

use crate::errors::BoardError;
use crate::services::AnalyticsService;
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;

/// GET /api/analytics/engagement
/// Notes per weekday, keyed Mon..Sun
pub async fn engagement(pool: web::Data<PgPool>) -> Result<impl Responder, BoardError> {
    let buckets = AnalyticsService::weekly_engagement(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(buckets))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/analytics").route("/engagement", web::get().to(engagement)));
}
