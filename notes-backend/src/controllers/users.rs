//! Login, logout and signup pages

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::error::AuthError;
use crate::forms::{FormErrors, FormRejection, LoginForm, SignupForm, USERNAME_TAKEN};
use crate::http::templates;
use crate::middleware::auth;
use crate::urls::{is_safe_redirect, patterns, Route};
use crate::{http, AppState};

#[derive(Debug, Deserialize)]
struct NextQuery {
    next: Option<String>,
}

async fn login_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<NextQuery>,
) -> impl Responder {
    let user = match auth::current_user(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    http::ok(templates::login_page(
        user.as_ref(),
        "",
        query.next.as_deref(),
        &FormErrors::new(),
    ))
}

async fn login(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
) -> impl Responder {
    let form = form.into_inner();
    let next = form
        .next
        .clone()
        .filter(|n| !n.is_empty())
        .or_else(|| query.into_inner().next);

    let user = match form.validate(&data.db) {
        Ok(user) => user,
        Err(FormRejection::Invalid(errors)) => {
            log::debug!("[AUTH] Failed login attempt for {:?}", form.username);
            return http::ok(templates::login_page(None, &form.username, next.as_deref(), &errors));
        }
        Err(FormRejection::Database(e)) => {
            log::error!("Login lookup failed: {}", e);
            return http::server_error();
        }
    };

    // Replace whatever session the browser already had
    if let Some(old_token) = auth::session_token(&req) {
        if let Err(e) = data.db.delete_session(&old_token) {
            log::warn!("Failed to drop previous session: {}", e);
        }
    }

    let session = match data.db.create_session(user.id) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to create session for user {}: {}", user.id, e);
            return http::server_error();
        }
    };
    log::info!("[AUTH] User {} logged in", user.id);

    let target = next
        .filter(|n| is_safe_redirect(n))
        .unwrap_or_else(|| Route::Home.path());

    HttpResponse::Found()
        .insert_header((header::LOCATION, target))
        .cookie(auth::session_cookie(&session.token, &data.config))
        .finish()
}

/// End the session. Works for GET and POST, and for visitors who were not logged in.
async fn logout(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Some(token) = auth::session_token(&req) {
        match data.db.delete_session(&token) {
            Ok(true) => log::info!("[AUTH] Session ended"),
            Ok(false) => {}
            Err(e) => {
                log::error!("Failed to delete session: {}", e);
                return http::server_error();
            }
        }
    }

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .cookie(auth::expired_session_cookie())
        .body(templates::logged_out_page())
}

async fn signup_form(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match auth::current_user(&data, &req) {
        Ok(user) => http::ok(templates::signup_page(user.as_ref(), "", &FormErrors::new())),
        Err(resp) => resp,
    }
}

async fn signup(data: web::Data<AppState>, form: web::Form<SignupForm>) -> impl Responder {
    let form = form.into_inner();

    let payload = match form.validate(&data.db) {
        Ok(payload) => payload,
        Err(FormRejection::Invalid(errors)) => {
            return http::ok(templates::signup_page(None, &form.username, &errors));
        }
        Err(FormRejection::Database(e)) => {
            log::error!("Signup validation failed: {}", e);
            return http::server_error();
        }
    };

    match data.db.create_user(&payload.username, Some(&payload.password)) {
        Ok(user) => {
            log::info!("[AUTH] New user {} ({})", user.id, user.username);
            http::redirect(&Route::Login.path())
        }
        // Lost a race with another signup for the same name
        Err(AuthError::UsernameTaken(_)) => http::ok(templates::signup_page(
            None,
            &form.username,
            &FormErrors::single("username", USERNAME_TAKEN),
        )),
        Err(e) => {
            log::error!("Failed to create user: {}", e);
            http::server_error()
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(patterns::LOGIN)
            .route(web::get().to(login_form))
            .route(web::post().to(login)),
    )
    .service(
        web::resource(patterns::LOGOUT)
            .route(web::get().to(logout))
            .route(web::post().to(logout)),
    )
    .service(
        web::resource(patterns::SIGNUP)
            .route(web::get().to(signup_form))
            .route(web::post().to(signup)),
    );
}
