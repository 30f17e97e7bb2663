//! Auth session database operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::sqlite::{format_timestamp, parse_timestamp};
use super::super::Database;
use super::users::{user_from_row, USER_COLUMNS};
use crate::models::{Session, User};

impl Database {
    /// Create a new auth session for `user_id` (web login)
    pub fn create_session(&self, user_id: i64) -> SqliteResult<Session> {
        let conn = self.conn.lock();
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + self.session_ttl;

        conn.execute(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                token,
                user_id,
                format_timestamp(&created_at),
                format_timestamp(&expires_at),
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Session {
            id,
            token,
            user_id,
            created_at,
            expires_at,
        })
    }

    /// Validate a session token and extend its expiry if valid
    pub fn validate_session(&self, token: &str) -> SqliteResult<Option<Session>> {
        let conn = self.conn.lock();
        let now = Utc::now();

        let session = conn
            .query_row(
                "SELECT id, token, user_id, created_at, expires_at FROM auth_sessions
                 WHERE token = ?1 AND expires_at > ?2",
                params![token, format_timestamp(&now)],
                |row| {
                    let created_at_str: String = row.get(3)?;
                    let expires_at_str: String = row.get(4)?;
                    Ok(Session {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: parse_timestamp(3, &created_at_str)?,
                        expires_at: parse_timestamp(4, &expires_at_str)?,
                    })
                },
            )
            .optional()?;

        // Keep active sessions alive
        match session {
            Some(mut session) => {
                let new_expires = now + self.session_ttl;
                conn.execute(
                    "UPDATE auth_sessions SET expires_at = ?1 WHERE id = ?2",
                    params![format_timestamp(&new_expires), session.id],
                )?;
                session.expires_at = new_expires;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Resolve a session token to its user, extending the session on success.
    pub fn session_user(&self, token: &str) -> SqliteResult<Option<User>> {
        let Some(session) = self.validate_session(token)? else {
            return Ok(None);
        };

        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            [session.user_id],
            user_from_row,
        )
        .optional()
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows_affected > 0)
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired_sessions(&self) -> SqliteResult<usize> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM auth_sessions WHERE expires_at <= ?1",
            [format_timestamp(&Utc::now())],
        )
    }
}
