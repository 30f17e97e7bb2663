//! Response helpers shared by the controllers

pub mod templates;

use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;

use crate::models::User;

pub fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub fn ok(body: String) -> HttpResponse {
    html(StatusCode::OK, body)
}

/// 302 to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

pub fn not_found(user: Option<&User>) -> HttpResponse {
    html(StatusCode::NOT_FOUND, templates::not_found_page(user))
}

pub fn bad_request(user: Option<&User>) -> HttpResponse {
    html(StatusCode::BAD_REQUEST, templates::bad_request_page(user))
}

pub fn server_error() -> HttpResponse {
    html(StatusCode::INTERNAL_SERVER_ERROR, templates::server_error_page())
}
