//! Named routes and their URL paths

/// actix resource patterns, registered by the controllers.
pub mod patterns {
    pub const HOME: &str = "/";
    pub const LIST: &str = "/notes/";
    pub const ADD: &str = "/add/";
    pub const SUCCESS: &str = "/done/";
    pub const DETAIL: &str = "/note/{slug}/";
    pub const EDIT: &str = "/edit/{slug}/";
    pub const DELETE: &str = "/delete/{slug}/";
    pub const LOGIN: &str = "/auth/login/";
    pub const LOGOUT: &str = "/auth/logout/";
    pub const SIGNUP: &str = "/auth/signup/";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Home,
    List,
    Add,
    Success,
    Detail(&'a str),
    Edit(&'a str),
    Delete(&'a str),
    Login,
    Logout,
    Signup,
}

impl Route<'_> {
    /// Route name as used in test messages, e.g. `notes:detail`.
    #[cfg(test)]
    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "notes:home",
            Route::List => "notes:list",
            Route::Add => "notes:add",
            Route::Success => "notes:success",
            Route::Detail(_) => "notes:detail",
            Route::Edit(_) => "notes:edit",
            Route::Delete(_) => "notes:delete",
            Route::Login => "users:login",
            Route::Logout => "users:logout",
            Route::Signup => "users:signup",
        }
    }

    /// Concrete path for this route, with the slug percent-encoded.
    pub fn path(&self) -> String {
        match self {
            Route::Home => patterns::HOME.to_string(),
            Route::List => patterns::LIST.to_string(),
            Route::Add => patterns::ADD.to_string(),
            Route::Success => patterns::SUCCESS.to_string(),
            Route::Detail(slug) => with_slug(patterns::DETAIL, slug),
            Route::Edit(slug) => with_slug(patterns::EDIT, slug),
            Route::Delete(slug) => with_slug(patterns::DELETE, slug),
            Route::Login => patterns::LOGIN.to_string(),
            Route::Logout => patterns::LOGOUT.to_string(),
            Route::Signup => patterns::SIGNUP.to_string(),
        }
    }
}

fn with_slug(pattern: &str, slug: &str) -> String {
    pattern.replace("{slug}", &urlencoding::encode(slug))
}

/// Login page URL that sends the user back to `next` afterwards.
///
/// Slashes stay literal so the result reads `/auth/login/?next=/add/`.
pub fn login_url_with_next(next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", patterns::LOGIN, encoded)
}

/// True if `next` is a local absolute path safe to redirect to after login.
pub fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.starts_with("/\\")
        && !next.chars().any(char::is_control)
}
