//! Note database operations
//!
//! Slug uniqueness is checked and written under a single connection lock, and
//! backed by the `UNIQUE` constraint on `notes.slug`.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Result as SqliteResult, Row};

use super::super::Database;
use crate::error::NoteError;
use crate::forms::{duplicate_slug_message, SLUG_UNDERIVABLE};
use crate::models::{Note, User};
use crate::notes::slug_from_title;
use crate::policy;

const NOTE_COLUMNS: &str = "id, title, text, slug, author_id";

fn note_from_row(row: &Row<'_>) -> SqliteResult<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        slug: row.get(3)?,
        author_id: row.get(4)?,
    })
}

/// Use the submitted slug when there is one, otherwise derive it from the title.
fn resolve_slug(slug: Option<&str>, title: &str) -> Result<String, NoteError> {
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_string(),
        None => slug_from_title(title),
    };
    if slug.is_empty() {
        return Err(NoteError::Validation {
            field: "slug",
            message: SLUG_UNDERIVABLE.to_string(),
        });
    }
    Ok(slug)
}

fn slug_exists(conn: &Connection, slug: &str, exclude_id: Option<i64>) -> SqliteResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE slug = ?1 AND id != ?2)",
        params![slug, exclude_id.unwrap_or(-1)],
        |row| row.get(0),
    )
}

fn duplicate_slug(slug: &str) -> NoteError {
    NoteError::Validation {
        field: "slug",
        message: duplicate_slug_message(slug),
    }
}

/// Map a UNIQUE violation on write to the same error the pre-check gives.
fn map_write_error(err: rusqlite::Error, slug: &str) -> NoteError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            duplicate_slug(slug)
        }
        other => NoteError::Database(other),
    }
}

impl Database {
    /// Create a note. Without a slug one is derived from the title.
    pub fn create_note(
        &self,
        title: &str,
        text: &str,
        slug: Option<&str>,
        author_id: i64,
    ) -> Result<Note, NoteError> {
        let slug = resolve_slug(slug, title)?;

        let conn = self.conn.lock();
        if slug_exists(&conn, &slug, None)? {
            return Err(duplicate_slug(&slug));
        }

        conn.execute(
            "INSERT INTO notes (title, text, slug, author_id) VALUES (?1, ?2, ?3, ?4)",
            params![title, text, slug, author_id],
        )
        .map_err(|e| map_write_error(e, &slug))?;

        Ok(Note {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
            text: text.to_string(),
            slug,
            author_id,
        })
    }

    /// Notes written by `author_id`, oldest first.
    pub fn list_notes_for(&self, author_id: i64) -> SqliteResult<Vec<Note>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes WHERE author_id = ?1 ORDER BY id",
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map([author_id], note_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(notes)
    }

    pub fn get_note_by_slug(&self, slug: &str) -> Result<Note, NoteError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM notes WHERE slug = ?1", NOTE_COLUMNS),
            [slug],
            note_from_row,
        )
        .optional()?
        .ok_or_else(|| NoteError::NotFound(slug.to_string()))
    }

    /// Fetch a note only if `user` wrote it; anyone else gets `NotFound`.
    pub fn get_note_for_author(&self, slug: &str, user: &User) -> Result<Note, NoteError> {
        let note = self.get_note_by_slug(slug)?;
        if !policy::can_view_or_edit_or_delete(user, &note) {
            log::debug!("[NOTES] user {} denied access to note {}", user.id, note.id);
            return Err(NoteError::NotFound(slug.to_string()));
        }
        Ok(note)
    }

    /// True if another note (not `exclude_id`) already uses `slug`.
    pub fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        slug_exists(&conn, slug, exclude_id)
    }

    /// Replace a note's title, text and slug. The author never changes.
    pub fn update_note(
        &self,
        note: &Note,
        title: &str,
        text: &str,
        slug: Option<&str>,
    ) -> Result<Note, NoteError> {
        let slug = resolve_slug(slug, title)?;

        let conn = self.conn.lock();
        if slug_exists(&conn, &slug, Some(note.id))? {
            return Err(duplicate_slug(&slug));
        }

        let rows = conn
            .execute(
                "UPDATE notes SET title = ?1, text = ?2, slug = ?3 WHERE id = ?4",
                params![title, text, slug, note.id],
            )
            .map_err(|e| map_write_error(e, &slug))?;
        if rows == 0 {
            return Err(NoteError::NotFound(note.slug.clone()));
        }

        Ok(Note {
            id: note.id,
            title: title.to_string(),
            text: text.to_string(),
            slug,
            author_id: note.author_id,
        })
    }

    pub fn delete_note(&self, note: &Note) -> Result<(), NoteError> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM notes WHERE id = ?1", [note.id])?;
        if rows == 0 {
            return Err(NoteError::NotFound(note.slug.clone()));
        }
        Ok(())
    }

    pub fn count_notes(&self) -> SqliteResult<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::error::NoteError;
    use crate::forms::WARNING;
    use crate::models::User;
    use crate::notes::slug::slugify;
    use chrono::Duration;

    struct Fixture {
        db: Database,
        author: User,
        reader: User,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory(Duration::hours(1)).expect("Failed to open database");
        let author = db.create_user("Кама Пуля", None).unwrap();
        let reader = db.create_user("Мага Лезгин", None).unwrap();
        Fixture { db, author, reader }
    }

    #[test]
    fn test_create_without_slug_transliterates_title() {
        let f = fixture();
        let note = f
            .db
            .create_note("Заметка № 1", "Текст к заметке", None, f.author.id)
            .unwrap();
        assert_eq!(note.slug, slugify("Заметка № 1"));
        assert_eq!(note.slug, "zametka-1");
        assert_eq!(note.author_id, f.author.id);
    }

    #[test]
    fn test_blank_slug_is_treated_as_missing() {
        let f = fixture();
        let note = f
            .db
            .create_note("Новая заметка", "Новый текст", Some("   "), f.author.id)
            .unwrap();
        assert_eq!(note.slug, "novaya-zametka");
    }

    #[test]
    fn test_duplicate_slug_rejected_and_count_unchanged() {
        let f = fixture();
        f.db.create_note("First", "a", Some("same"), f.author.id).unwrap();

        let err = f
            .db
            .create_note("Second", "b", Some("same"), f.reader.id)
            .unwrap_err();
        match err {
            NoteError::Validation { field, message } => {
                assert_eq!(field, "slug");
                assert_eq!(message, format!("same{}", WARNING));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(f.db.count_notes().unwrap(), 1);
    }

    #[test]
    fn test_derived_slug_collision_rejected() {
        let f = fixture();
        f.db.create_note("Заметка", "a", None, f.author.id).unwrap();
        let err = f.db.create_note("заметка!", "b", None, f.author.id).unwrap_err();
        assert!(matches!(err, NoteError::Validation { field: "slug", .. }));
    }

    #[test]
    fn test_underivable_slug_rejected() {
        let f = fixture();
        let err = f.db.create_note("№", "a", None, f.author.id).unwrap_err();
        assert!(matches!(err, NoteError::Validation { field: "slug", .. }));
        assert_eq!(f.db.count_notes().unwrap(), 0);
    }

    #[test]
    fn test_list_only_contains_own_notes() {
        let f = fixture();
        let own = f.db.create_note("Mine", "a", None, f.author.id).unwrap();
        let other = f.db.create_note("Theirs", "b", None, f.reader.id).unwrap();

        let author_notes = f.db.list_notes_for(f.author.id).unwrap();
        assert!(author_notes.contains(&own));
        assert!(!author_notes.contains(&other));

        let reader_notes = f.db.list_notes_for(f.reader.id).unwrap();
        assert_eq!(reader_notes, vec![other]);
    }

    #[test]
    fn test_get_by_slug_and_for_author() {
        let f = fixture();
        let note = f.db.create_note("Private", "a", None, f.author.id).unwrap();

        assert_eq!(f.db.get_note_by_slug("private").unwrap(), note);
        assert!(matches!(f.db.get_note_by_slug("missing"), Err(NoteError::NotFound(_))));

        assert_eq!(f.db.get_note_for_author("private", &f.author).unwrap(), note);
        assert!(matches!(
            f.db.get_note_for_author("private", &f.reader),
            Err(NoteError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_keeps_author_and_allows_own_slug() {
        let f = fixture();
        let note = f.db.create_note("Old", "old", Some("keep"), f.author.id).unwrap();

        let updated = f.db.update_note(&note, "New", "new", Some("keep")).unwrap();
        assert_eq!(updated.slug, "keep");
        assert_eq!(updated.author_id, f.author.id);

        let stored = f.db.get_note_by_slug("keep").unwrap();
        assert_eq!(stored.title, "New");
        assert_eq!(stored.text, "new");
    }

    #[test]
    fn test_update_rejects_slug_of_other_note() {
        let f = fixture();
        f.db.create_note("A", "a", Some("taken"), f.author.id).unwrap();
        let note = f.db.create_note("B", "b", Some("mine"), f.author.id).unwrap();

        let err = f.db.update_note(&note, "B2", "b2", Some("taken")).unwrap_err();
        assert!(matches!(err, NoteError::Validation { field: "slug", .. }));
        assert_eq!(f.db.get_note_by_slug("mine").unwrap().title, "B");
    }

    #[test]
    fn test_update_with_empty_slug_regenerates_from_title() {
        let f = fixture();
        let note = f.db.create_note("Old", "a", None, f.author.id).unwrap();
        let updated = f.db.update_note(&note, "Новый заголовок", "a", None).unwrap();
        assert_eq!(updated.slug, "novyj-zagolovok");
    }

    #[test]
    fn test_delete() {
        let f = fixture();
        let note = f.db.create_note("Gone", "a", None, f.author.id).unwrap();
        f.db.delete_note(&note).unwrap();
        assert_eq!(f.db.count_notes().unwrap(), 0);
        assert!(matches!(f.db.delete_note(&note), Err(NoteError::NotFound(_))));
    }
}
