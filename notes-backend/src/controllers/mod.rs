use actix_web::{web, HttpRequest, HttpResponse};

use crate::middleware::auth;
use crate::{http, AppState};

/// Build a test service with every controller and the 404 fallback. Declared
/// ahead of the controller modules so their tests see it by textual scope.
#[cfg(test)]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .configure($crate::controllers::configure)
                .default_service(actix_web::web::to($crate::controllers::not_found)),
        )
        .await
    };
}

pub mod health;
pub mod notes;
pub mod users;

/// Largest accepted urlencoded form body.
const MAX_FORM_BYTES: usize = 256 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(MAX_FORM_BYTES));
    health::config_routes(cfg);
    notes::config(cfg);
    users::config(cfg);
}

/// Fallback for unmatched routes.
pub async fn not_found(data: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let user = auth::current_user(&data, &req).ok().flatten();
    http::not_found(user.as_ref())
}
