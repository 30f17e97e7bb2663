//! Who may do what with a note.

use crate::models::{Note, User};

/// Only a note's author may view, edit or delete it.
pub fn can_view_or_edit_or_delete(user: &User, note: &Note) -> bool {
    user.id == note.author_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{id}"),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_author_is_allowed() {
        let note = Note {
            id: 1,
            title: "t".to_string(),
            text: "x".to_string(),
            slug: "t".to_string(),
            author_id: 7,
        };
        assert!(can_view_or_edit_or_delete(&user(7), &note));
        assert!(!can_view_or_edit_or_delete(&user(8), &note));
    }
}
