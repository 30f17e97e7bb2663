//! Note pages: home, list, create, detail, edit, delete and the success page.
//!
//! Everything except the home page needs a login. Single-note pages answer
//! 404 to anyone but the note's author.

use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::error::NoteError;
use crate::forms::{FormErrors, FormRejection, NoteForm};
use crate::http::templates::{self, NoteFormAction};
use crate::middleware::auth;
use crate::models::{Note, User};
use crate::urls::{patterns, Route};
use crate::{http, AppState};

/// Load a note for its author; any other user gets the same 404 as a missing note.
fn authored_note(data: &web::Data<AppState>, user: &User, slug: &str) -> Result<Note, HttpResponse> {
    data.db.get_note_for_author(slug, user).map_err(|e| match e {
        NoteError::NotFound(_) => http::not_found(Some(user)),
        other => {
            log::error!("Failed to load note {}: {}", slug, other);
            http::server_error()
        }
    })
}

/// Re-render the note form with its errors, or fail with 500 on storage errors.
fn form_rejected(
    user: &User,
    action: NoteFormAction<'_>,
    form: &NoteForm,
    rejection: FormRejection,
) -> HttpResponse {
    match rejection {
        FormRejection::Invalid(errors) => {
            http::ok(templates::note_form_page(user, action, form, &errors))
        }
        FormRejection::Database(e) => {
            log::error!("Failed to validate note form: {}", e);
            http::server_error()
        }
    }
}

/// Unwrap a note form body. Called only after the login and author checks, so
/// anonymous and non-author requests never see a body error.
fn note_form_body(
    user: &User,
    form: Result<web::Form<NoteForm>, actix_web::Error>,
) -> Result<NoteForm, HttpResponse> {
    form.map(web::Form::into_inner).map_err(|e| {
        log::debug!("[NOTES] Rejected note form from user {}: {}", user.id, e);
        http::bad_request(Some(user))
    })
}

fn success_redirect() -> HttpResponse {
    http::redirect(&Route::Success.path())
}

async fn home(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match auth::current_user(&data, &req) {
        Ok(user) => http::ok(templates::home_page(user.as_ref())),
        Err(resp) => resp,
    }
}

async fn list_notes(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let user = match auth::require_login(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match data.db.list_notes_for(user.id) {
        Ok(notes) => http::ok(templates::note_list_page(&user, &notes)),
        Err(e) => {
            log::error!("Failed to list notes for user {}: {}", user.id, e);
            http::server_error()
        }
    }
}

async fn add_note_form(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let user = match auth::require_login(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    http::ok(templates::note_form_page(
        &user,
        NoteFormAction::Add,
        &NoteForm::default(),
        &FormErrors::new(),
    ))
}

async fn add_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    form: Result<web::Form<NoteForm>, actix_web::Error>,
) -> impl Responder {
    let user = match auth::require_login(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let form = match note_form_body(&user, form) {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    let payload = match form.validate(&data.db, None) {
        Ok(payload) => payload,
        Err(rejection) => return form_rejected(&user, NoteFormAction::Add, &form, rejection),
    };

    match data
        .db
        .create_note(&payload.title, &payload.text, Some(&payload.slug), user.id)
    {
        Ok(note) => {
            log::info!("[NOTES] User {} created note {} ({})", user.id, note.id, note.slug);
            success_redirect()
        }
        Err(e) => form_rejected(&user, NoteFormAction::Add, &form, e.into()),
    }
}

async fn success(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match auth::require_login(&data, &req) {
        Ok(user) => http::ok(templates::success_page(&user)),
        Err(resp) => resp,
    }
}

async fn note_detail(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let user = match auth::require_login(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match authored_note(&data, &user, &path) {
        Ok(note) => http::ok(templates::note_detail_page(&user, &note)),
        Err(resp) => resp,
    }
}

async fn edit_note_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let user = match auth::require_login(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let note = match authored_note(&data, &user, &path) {
        Ok(note) => note,
        Err(resp) => return resp,
    };

    http::ok(templates::note_form_page(
        &user,
        NoteFormAction::Edit(&note.slug),
        &NoteForm::from_note(&note),
        &FormErrors::new(),
    ))
}

async fn edit_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    form: Result<web::Form<NoteForm>, actix_web::Error>,
) -> impl Responder {
    let user = match auth::require_login(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let note = match authored_note(&data, &user, &path) {
        Ok(note) => note,
        Err(resp) => return resp,
    };
    let form = match note_form_body(&user, form) {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    let action = NoteFormAction::Edit(&note.slug);

    let payload = match form.validate(&data.db, Some(note.id)) {
        Ok(payload) => payload,
        Err(rejection) => return form_rejected(&user, action, &form, rejection),
    };

    match data
        .db
        .update_note(&note, &payload.title, &payload.text, Some(&payload.slug))
    {
        Ok(updated) => {
            log::info!(
                "[NOTES] User {} updated note {} ({} -> {})",
                user.id,
                updated.id,
                note.slug,
                updated.slug
            );
            success_redirect()
        }
        Err(e) => form_rejected(&user, action, &form, e.into()),
    }
}

async fn delete_note_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let user = match auth::require_login(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match authored_note(&data, &user, &path) {
        Ok(note) => http::ok(templates::note_delete_page(&user, &note)),
        Err(resp) => resp,
    }
}

async fn delete_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let user = match auth::require_login(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let note = match authored_note(&data, &user, &path) {
        Ok(note) => note,
        Err(resp) => return resp,
    };

    match data.db.delete_note(&note) {
        Ok(()) => {
            log::info!("[NOTES] User {} deleted note {} ({})", user.id, note.id, note.slug);
            success_redirect()
        }
        Err(NoteError::NotFound(_)) => http::not_found(Some(&user)),
        Err(e) => {
            log::error!("Failed to delete note {}: {}", note.slug, e);
            http::server_error()
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(patterns::HOME).route(web::get().to(home)))
        .service(web::resource(patterns::LIST).route(web::get().to(list_notes)))
        .service(
            web::resource(patterns::ADD)
                .route(web::get().to(add_note_form))
                .route(web::post().to(add_note)),
        )
        .service(web::resource(patterns::SUCCESS).route(web::get().to(success)))
        .service(web::resource(patterns::DETAIL).route(web::get().to(note_detail)))
        .service(
            web::resource(patterns::EDIT)
                .route(web::get().to(edit_note_form))
                .route(web::post().to(edit_note)),
        )
        .service(
            web::resource(patterns::DELETE)
                .route(web::get().to(delete_note_form))
                .route(web::post().to(delete_note)),
        );
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};

    use crate::controllers::test_support::{body_text, location, Fixture};
    use crate::forms::WARNING;
    use crate::notes::slug_from_title;
    use crate::urls::{login_url_with_next, Route};

    const FORM_DATA: [(&str, &str); 3] = [
        ("title", "Новая заметка"),
        ("text", "Новый текст"),
        ("slug", "new-note"),
    ];

    #[actix_web::test]
    async fn test_home_is_public() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let resp = test::call_service(&app, TestRequest::get().uri(&Route::Home.path()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_pages_availability_for_different_users() {
        let f = Fixture::new();
        let app = test_app!(f.state);
        let slug = f.note.slug.as_str();

        for (user, expected) in [(&f.author, StatusCode::OK), (&f.reader, StatusCode::NOT_FOUND)] {
            let cookie = f.login(user);
            for route in [Route::Detail(slug), Route::Edit(slug), Route::Delete(slug)] {
                let req = TestRequest::get()
                    .uri(&route.path())
                    .cookie(cookie.clone())
                    .to_request();
                let resp = test::call_service(&app, req).await;
                assert_eq!(resp.status(), expected, "{} as {}", route.name(), user.username);
            }
        }
    }

    #[actix_web::test]
    async fn test_pages_availability_for_auth_user() {
        let f = Fixture::new();
        let app = test_app!(f.state);
        let cookie = f.login(&f.author);

        for route in [Route::Add, Route::List, Route::Success] {
            let req = TestRequest::get()
                .uri(&route.path())
                .cookie(cookie.clone())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{}", route.name());
        }
    }

    #[actix_web::test]
    async fn test_redirects_anonymous_to_login() {
        let f = Fixture::new();
        let app = test_app!(f.state);
        let slug = f.note.slug.as_str();

        for route in [
            Route::Add,
            Route::List,
            Route::Success,
            Route::Edit(slug),
            Route::Detail(slug),
            Route::Delete(slug),
        ] {
            let url = route.path();
            let resp = test::call_service(&app, TestRequest::get().uri(&url).to_request()).await;
            assert_eq!(resp.status(), StatusCode::FOUND, "{}", route.name());
            assert_eq!(location(&resp), format!("{}?next={}", Route::Login.path(), url));
            assert_eq!(location(&resp), login_url_with_next(&url));
        }
    }

    #[actix_web::test]
    async fn test_expired_or_unknown_session_is_anonymous() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::get()
            .uri(&Route::List.path())
            .cookie(actix_web::cookie::Cookie::new("sessionid", "bogus"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    #[actix_web::test]
    async fn test_notes_list_for_different_users() {
        let f = Fixture::new();
        let app = test_app!(f.state);
        let detail_link = format!(r#"href="{}""#, Route::Detail(&f.note.slug).path());

        for (user, should_contain) in [(&f.author, true), (&f.reader, false)] {
            let req = TestRequest::get()
                .uri(&Route::List.path())
                .cookie(f.login(user))
                .to_request();
            let body = body_text(test::call_service(&app, req).await).await;
            assert_eq!(body.contains(&detail_link), should_contain, "list of {}", user.username);
        }
    }

    #[actix_web::test]
    async fn test_pages_contains_form() {
        let f = Fixture::new();
        let app = test_app!(f.state);
        let cookie = f.login(&f.author);

        for route in [Route::Add, Route::Edit(&f.note.slug)] {
            let req = TestRequest::get()
                .uri(&route.path())
                .cookie(cookie.clone())
                .to_request();
            let body = body_text(test::call_service(&app, req).await).await;
            assert!(body.contains(r#"id="note-form""#), "{}", route.name());
            assert!(body.contains(r#"name="title""#));
            assert!(body.contains(r#"name="slug""#));
        }
    }

    #[actix_web::test]
    async fn test_edit_form_is_prefilled() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::get()
            .uri(&Route::Edit(&f.note.slug).path())
            .cookie(f.login(&f.author))
            .to_request();
        let body = body_text(test::call_service(&app, req).await).await;
        assert!(body.contains(&format!(r#"value="{}""#, f.note.slug)));
        assert!(body.contains("Текст к заметке"));
    }

    #[actix_web::test]
    async fn test_user_can_create_note() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Add.path())
            .cookie(f.login(&f.author))
            .set_form(FORM_DATA)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), Route::Success.path());
        assert_eq!(f.note_count(), 2);

        let note = f.state.db.get_note_by_slug("new-note").unwrap();
        assert_eq!(note.title, "Новая заметка");
        assert_eq!(note.text, "Новый текст");
        assert_eq!(note.slug, "new-note");
        assert_eq!(note.author_id, f.author.id);
    }

    #[actix_web::test]
    async fn test_anonymous_user_cant_create_note() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Add.path())
            .set_form(FORM_DATA)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), login_url_with_next(&Route::Add.path()));
        assert_eq!(f.note_count(), 1);
    }

    #[actix_web::test]
    async fn test_not_unique_slug() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Add.path())
            .cookie(f.login(&f.author))
            .set_form([
                ("title", "Новая заметка"),
                ("text", "Новый текст"),
                ("slug", f.note.slug.as_str()),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_text(resp).await;
        assert!(body.contains(&format!("{}{}", f.note.slug, WARNING)));
        assert_eq!(f.note_count(), 1);
    }

    #[actix_web::test]
    async fn test_empty_slug() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Add.path())
            .cookie(f.login(&f.author))
            .set_form([("title", "Новая заметка"), ("text", "Новый текст")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), Route::Success.path());
        assert_eq!(f.note_count(), 2);

        let notes = f.state.db.list_notes_for(f.author.id).unwrap();
        let note = notes.last().unwrap();
        assert_eq!(note.slug, slug_from_title(&note.title));
    }

    #[actix_web::test]
    async fn test_missing_fields_rerender_form() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Add.path())
            .cookie(f.login(&f.author))
            .set_form([("slug", "lonely-slug")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_text(resp).await;
        assert!(body.contains(crate::forms::REQUIRED));
        assert!(body.contains(r#"value="lonely-slug""#));
        assert_eq!(f.note_count(), 1);
    }

    #[actix_web::test]
    async fn test_author_can_edit_note() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Edit(&f.note.slug).path())
            .cookie(f.login(&f.author))
            .set_form(FORM_DATA)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), Route::Success.path());

        let note = f.state.db.get_note_by_slug("new-note").unwrap();
        assert_eq!(note.id, f.note.id);
        assert_eq!(note.title, "Новая заметка");
        assert_eq!(note.text, "Новый текст");
        assert_eq!(note.author_id, f.author.id);
    }

    #[actix_web::test]
    async fn test_other_user_cant_edit_note() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Edit(&f.note.slug).path())
            .cookie(f.login(&f.reader))
            .set_form(FORM_DATA)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let note_from_db = f.state.db.get_note_by_slug(&f.note.slug).unwrap();
        assert_eq!(note_from_db, f.note);
    }

    #[actix_web::test]
    async fn test_author_can_delete_note() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Delete(&f.note.slug).path())
            .cookie(f.login(&f.author))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), Route::Success.path());
        assert_eq!(f.note_count(), 0);
    }

    #[actix_web::test]
    async fn test_other_user_cant_delete_note() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::post()
            .uri(&Route::Delete(&f.note.slug).path())
            .cookie(f.login(&f.reader))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(f.note_count(), 1);
    }

    #[actix_web::test]
    async fn test_access_checks_run_before_body_parsing() {
        let f = Fixture::new();
        let app = test_app!(f.state);
        let slug = f.note.slug.as_str();

        for route in [Route::Add, Route::Edit(slug), Route::Delete(slug)] {
            let url = route.path();
            let resp = test::call_service(&app, TestRequest::post().uri(&url).to_request()).await;
            assert_eq!(resp.status(), StatusCode::FOUND, "anonymous {}", route.name());
            assert_eq!(location(&resp), login_url_with_next(&url));
        }

        let cookie = f.login(&f.reader);
        for route in [Route::Edit(slug), Route::Delete(slug)] {
            let empty = TestRequest::post()
                .uri(&route.path())
                .cookie(cookie.clone())
                .to_request();
            let resp = test::call_service(&app, empty).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "reader {}", route.name());

            let json = TestRequest::post()
                .uri(&route.path())
                .cookie(cookie.clone())
                .set_json(serde_json::json!({ "title": "Чужая", "text": "Чужой текст" }))
                .to_request();
            let resp = test::call_service(&app, json).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "reader json {}", route.name());
        }

        assert_eq!(f.note_count(), 1);
        assert_eq!(f.state.db.get_note_by_slug(slug).unwrap(), f.note);
    }

    #[actix_web::test]
    async fn test_unreadable_form_body_is_bad_request() {
        let f = Fixture::new();
        let app = test_app!(f.state);
        let cookie = f.login(&f.author);

        for route in [Route::Add, Route::Edit(&f.note.slug)] {
            let req = TestRequest::post()
                .uri(&route.path())
                .cookie(cookie.clone())
                .set_json(serde_json::json!({ "title": "Новая", "text": "Текст" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", route.name());
        }
        assert_eq!(f.note_count(), 1);
    }

    #[actix_web::test]
    async fn test_unknown_slug_is_not_found_for_author() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let req = TestRequest::get()
            .uri(&Route::Detail("missing").path())
            .cookie(f.login(&f.author))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_unmatched_route_is_not_found() {
        let f = Fixture::new();
        let app = test_app!(f.state);

        let resp =
            test::call_service(&app, TestRequest::get().uri("/no/such/page/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
