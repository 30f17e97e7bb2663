//! SQLite connection and schema

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        text TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_notes_author ON notes(author_id);

    CREATE TABLE IF NOT EXISTS auth_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        token TEXT NOT NULL UNIQUE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );
";

/// Shared handle to the application database.
///
/// Each table's operations live in an `impl Database` block under `db::models`.
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
    pub(crate) session_ttl: Duration,
}

impl Database {
    /// Open (or create) the database at `database_url` and apply the schema.
    /// `":memory:"` opens a private in-memory database.
    pub fn new(database_url: &str, session_ttl: Duration) -> SqliteResult<Self> {
        let conn = if database_url == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        log::warn!("Could not create database directory {:?}: {}", parent, e);
                    }
                }
            }
            Connection::open(database_url)?
        };

        Self::from_connection(conn, session_ttl)
    }

    pub fn open_in_memory(session_ttl: Duration) -> SqliteResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, session_ttl)
    }

    fn from_connection(conn: Connection, session_ttl: Duration) -> SqliteResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            session_ttl,
        })
    }

    /// Cheap liveness probe for the health endpoint.
    pub fn ping(&self) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |_| Ok(()))
    }
}

/// Fixed-width UTC timestamp; keeps lexical order equal to time order in SQL comparisons.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: usize, raw: &str) -> SqliteResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}
