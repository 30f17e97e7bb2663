use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
    cfg.service(web::resource("/api/health/config").route(web::get().to(get_config_status)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let uptime_secs = state.started_at.elapsed().as_secs();

    match state.db.ping() {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "version": VERSION,
            "uptime_secs": uptime_secs
        })),
        Err(e) => {
            log::error!("Health check database error: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "degraded",
                "version": VERSION,
                "uptime_secs": uptime_secs,
                "error": "Database unavailable"
            }))
        }
    }
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}

async fn get_config_status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "in_memory_database": state.config.database_url == ":memory:",
        "session_ttl_hours": state.config.session_ttl_hours,
        "secure_cookies": state.config.secure_cookies
    }))
}
