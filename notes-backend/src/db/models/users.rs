//! User account database operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{format_timestamp, parse_timestamp};
use super::super::Database;
use crate::error::AuthError;
use crate::models::User;
use crate::password;

pub(crate) const USER_COLUMNS: &str = "users.id, users.username, users.password_hash, users.created_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> SqliteResult<User> {
    let created_at_str: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_timestamp(3, &created_at_str)?,
    })
}

impl Database {
    /// Create a user. Without a password the account cannot log in until one is set.
    pub fn create_user(&self, username: &str, password: Option<&str>) -> Result<User, AuthError> {
        // Hash before taking the lock; it is the slow part.
        let password_hash = match password {
            Some(raw) => password::hash_password(raw),
            None => password::UNUSABLE_PASSWORD.to_string(),
        };
        let created_at = Utc::now();

        let conn = self.conn.lock();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            [username],
            |row| row.get(0),
        )?;
        if exists {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, format_timestamp(&created_at)],
        )?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash,
            created_at,
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
            [username],
            user_from_row,
        )
        .optional()
    }

    pub fn username_taken(&self, username: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            [username],
            |row| row.get(0),
        )
    }

    /// Look up a user by credentials. `None` for an unknown user or a wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> SqliteResult<Option<User>> {
        let user = self.get_user_by_username(username)?;
        Ok(user.filter(|u| password::verify_password(password, &u.password_hash)))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::error::AuthError;
    use chrono::Duration;

    fn db() -> Database {
        Database::open_in_memory(Duration::hours(1)).expect("Failed to open database")
    }

    #[test]
    fn test_create_and_authenticate() {
        let db = db();
        let user = db.create_user("Кама Пуля", Some("s3cret-pass")).unwrap();
        assert_eq!(user.username, "Кама Пуля");

        let found = db.authenticate("Кама Пуля", "s3cret-pass").unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(db.authenticate("Кама Пуля", "nope").unwrap().is_none());
        assert!(db.authenticate("nobody", "s3cret-pass").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let db = db();
        db.create_user("reader", None).unwrap();
        let result = db.create_user("reader", Some("another-pass"));
        assert!(matches!(result, Err(AuthError::UsernameTaken(name)) if name == "reader"));
        assert!(db.username_taken("reader").unwrap());
        assert!(!db.username_taken("writer").unwrap());
    }

    #[test]
    fn test_user_without_password_cannot_log_in() {
        let db = db();
        db.create_user("fixture", None).unwrap();
        assert!(db.authenticate("fixture", "").unwrap().is_none());
        assert!(db.authenticate("fixture", "!").unwrap().is_none());
    }
}
