// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{seeder, start_cleanup_task, FirestoreClient, NotesCache, SyncService};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            format!("{},actix_web=info,sqlx=warn", config.log_level)
        } else {
            "info,actix_web=info,sqlx=warn".to_string()
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting visiboard-backend...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Firestore client (mirroring and import)
    let firestore = FirestoreClient::from_config(&config);
    match &firestore {
        Some(client) => log::info!("Firestore mirroring enabled for project {}", client.project_id()),
        None => log::info!("Firestore mirroring disabled"),
    }

    if config.sync_on_startup {
        if let Some(client) = &firestore {
            match SyncService::sync_from_firestore(&pool, client).await {
                Ok(stats) => log::info!(
                    "Startup sync imported {} users, {} notes, {} comments",
                    stats.users_imported,
                    stats.notes_imported,
                    stats.comments_imported
                ),
                Err(e) => log::error!("Startup sync failed: {}", e),
            }
        }
    }

    // 6. Seed demo data
    if let Err(e) = seeder::seed(&pool).await {
        log::error!("Failed to seed data: {}", e);
    }

    // 7. Initialize cache for nearby queries
    let cache = Arc::new(NotesCache::new(config.nearby_cache_ttl_secs));
    log::info!(
        "Initialized nearby notes cache (TTL: {}s)",
        config.nearby_cache_ttl_secs
    );

    // Start background cleanup task (runs every 5 minutes)
    start_cleanup_task(cache.clone(), 300);

    // 8. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(firestore.clone()))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::api_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
