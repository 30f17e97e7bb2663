use serde::{Deserialize, Serialize};

/// A private note. Only its author may see, edit or delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Unique across all notes; used in note URLs.
    pub slug: String,
    /// Set at creation, never reassigned.
    pub author_id: i64,
}
