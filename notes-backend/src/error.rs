use thiserror::Error;

/// Failures of note store operations.
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Note not found: {0}")]
    NotFound(String),
    /// A form-level problem tied to one field; the message is shown to the user as-is.
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Failures of user account and session operations.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username already taken: {0}")]
    UsernameTaken(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}
