//! Form validation for note, signup and login submissions
//!
//! Error messages are user-facing and shown next to the offending field.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::db::Database;
use crate::error::NoteError;
use crate::models::{Note, User};
use crate::notes::{slug::is_valid_slug, slug_from_title, MAX_SLUG_LEN};

/// Appended to a slug that is already in use to form the field error.
pub const WARNING: &str = " - такой slug уже существует, придумайте уникальное значение!";

pub const REQUIRED: &str = "Обязательное поле.";
pub const SLUG_INVALID: &str =
    "Значение должно состоять только из латинских букв, цифр, знаков подчеркивания или дефиса.";
pub const SLUG_UNDERIVABLE: &str =
    "Не удалось составить slug из заголовка, укажите его вручную.";
pub const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";
pub const USERNAME_INVALID: &str = "Введите правильное имя пользователя. \
     Оно может содержать только буквы, цифры и знаки @/./+/-/_.";
pub const PASSWORD_MISMATCH: &str = "Введенные пароли не совпадают.";
pub const INVALID_LOGIN: &str = "Пожалуйста, введите правильные имя пользователя и пароль. \
     Оба поля могут быть чувствительны к регистру.";

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn duplicate_slug_message(slug: &str) -> String {
    format!("{}{}", slug, WARNING)
}

fn too_long(max: usize, actual: usize) -> String {
    format!("Убедитесь, что это значение содержит не более {max} символов (сейчас {actual}).")
}

fn password_too_short() -> String {
    format!(
        "Введённый пароль слишком короткий. Он должен содержать как минимум {MIN_PASSWORD_LEN} символов."
    )
}

/// Field errors keyed by field name, plus errors that belong to the whole form.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

/// Why a submission was not accepted.
#[derive(Debug, Error)]
pub enum FormRejection {
    #[error("Form has errors")]
    Invalid(FormErrors),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl From<NoteError> for FormRejection {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::Validation { field, message } => Self::Invalid(FormErrors::single(field, message)),
            NoteError::Database(e) => Self::Database(e),
            NoteError::NotFound(slug) => {
                Self::Invalid(FormErrors::single("slug", format!("Note not found: {slug}")))
            }
        }
    }
}

fn required(errors: &mut FormErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
}

/// Raw note submission. Missing fields deserialize as empty strings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub slug: String,
}

/// A note submission that passed validation; `slug` is always resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePayload {
    pub title: String,
    pub text: String,
    pub slug: String,
}

impl NoteForm {
    /// Prefilled form for editing an existing note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
        }
    }

    /// Validate the submission. `instance_id` is the note being edited, so
    /// that it does not collide with its own slug.
    pub fn validate(&self, db: &Database, instance_id: Option<i64>) -> Result<NotePayload, FormRejection> {
        let title = self.title.trim();
        let text = self.text.trim();
        let slug = self.slug.trim();

        let mut errors = FormErrors::new();
        required(&mut errors, "title", title);
        required(&mut errors, "text", text);

        let title_len = title.chars().count();
        if title_len > MAX_TITLE_LEN {
            errors.add("title", too_long(MAX_TITLE_LEN, title_len));
        }

        let slug_len = slug.chars().count();
        if slug_len > MAX_SLUG_LEN {
            errors.add("slug", too_long(MAX_SLUG_LEN, slug_len));
        } else if !slug.is_empty() && !is_valid_slug(slug) {
            errors.add("slug", SLUG_INVALID);
        }

        if !errors.is_empty() {
            return Err(FormRejection::Invalid(errors));
        }

        let slug = if slug.is_empty() {
            slug_from_title(title)
        } else {
            slug.to_string()
        };
        if slug.is_empty() {
            return Err(FormRejection::Invalid(FormErrors::single("slug", SLUG_UNDERIVABLE)));
        }
        if db.slug_taken(&slug, instance_id)? {
            return Err(FormRejection::Invalid(FormErrors::single(
                "slug",
                duplicate_slug_message(&slug),
            )));
        }

        Ok(NotePayload {
            title: title.to_string(),
            text: text.to_string(),
            slug,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupPayload {
    pub username: String,
    pub password: String,
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

impl SignupForm {
    pub fn validate(&self, db: &Database) -> Result<SignupPayload, FormRejection> {
        let username = self.username.trim();
        let mut errors = FormErrors::new();

        required(&mut errors, "username", username);
        required(&mut errors, "password1", &self.password1);
        required(&mut errors, "password2", &self.password2);

        let username_len = username.chars().count();
        if username_len > MAX_USERNAME_LEN {
            errors.add("username", too_long(MAX_USERNAME_LEN, username_len));
        } else if !username.is_empty() && !is_valid_username(username) {
            errors.add("username", USERNAME_INVALID);
        } else if !username.is_empty() && db.username_taken(username)? {
            errors.add("username", USERNAME_TAKEN);
        }

        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", PASSWORD_MISMATCH);
            } else if self.password1.chars().count() < MIN_PASSWORD_LEN {
                errors.add("password2", password_too_short());
            }
        }

        if !errors.is_empty() {
            return Err(FormRejection::Invalid(errors));
        }

        Ok(SignupPayload {
            username: username.to_string(),
            password: self.password1.clone(),
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after a successful login.
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    /// Resolve the credentials to a user.
    pub fn validate(&self, db: &Database) -> Result<User, FormRejection> {
        let username = self.username.trim();
        let mut errors = FormErrors::new();
        required(&mut errors, "username", username);
        required(&mut errors, "password", &self.password);
        if !errors.is_empty() {
            return Err(FormRejection::Invalid(errors));
        }

        match db.authenticate(username, &self.password)? {
            Some(user) => Ok(user),
            None => {
                let mut errors = FormErrors::new();
                errors.add_non_field(INVALID_LOGIN);
                Err(FormRejection::Invalid(errors))
            }
        }
    }
}
