use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod db;
mod error;
mod forms;
pub mod http;
mod middleware;
mod models;
mod notes;
mod password;
mod policy;
mod urls;

use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    /// Server start time for uptime calculation
    pub started_at: std::time::Instant,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("notes-backend v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let port = config.port;
    let bind_address = config.bind_address.clone();

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url, config.session_ttl())
        .map_err(|e| std::io::Error::other(format!("Failed to initialize database: {}", e)))?;
    let db = Arc::new(db);

    match db.purge_expired_sessions() {
        Ok(0) => {}
        Ok(n) => log::info!("Removed {} expired sessions", n),
        Err(e) => log::warn!("Failed to purge expired sessions: {}", e),
    }

    let started_at = std::time::Instant::now();
    let server_db = db.clone();

    log::info!("Listening on {}:{}", bind_address, port);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&server_db),
                config: config.clone(),
                started_at,
            }))
            .wrap(Logger::default())
            .configure(controllers::configure)
            .default_service(web::to(controllers::not_found))
    })
    .bind((bind_address.as_str(), port))?
    .run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    // Spawn Ctrl+C handler
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        // Stop the HTTP server with timeout
        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(std::time::Duration::from_secs(5), server_stop).await.is_err() {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }

        log::info!("Shutdown complete");
    });

    server.await
}
