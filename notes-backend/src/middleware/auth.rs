//! Session lookup and login enforcement for page handlers

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::config::Config;
use crate::http;
use crate::models::User;
use crate::urls::login_url_with_next;
use crate::AppState;

pub const SESSION_COOKIE: &str = "sessionid";

/// Session token from the `sessionid` cookie, or from `Authorization: Bearer`.
pub fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The logged-in user, if the request carries a valid session.
pub fn current_user(state: &web::Data<AppState>, req: &HttpRequest) -> Result<Option<User>, HttpResponse> {
    let Some(token) = session_token(req) else {
        return Ok(None);
    };

    state.db.session_user(&token).map_err(|e| {
        log::error!("Session validation error: {}", e);
        http::server_error()
    })
}

/// The logged-in user, or a redirect to the login page that returns here.
pub fn require_login(state: &web::Data<AppState>, req: &HttpRequest) -> Result<User, HttpResponse> {
    match current_user(state, req)? {
        Some(user) => Ok(user),
        None => Err(redirect_to_login(req)),
    }
}

pub fn redirect_to_login(req: &HttpRequest) -> HttpResponse {
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string());
    http::redirect(&login_url_with_next(&next))
}

pub fn session_cookie(token: &str, config: &Config) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .max_age(CookieDuration::hours(config.session_ttl_hours))
        .finish()
}

/// Cookie that tells the browser to forget the session.
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}
