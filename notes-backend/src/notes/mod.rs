//! Note helpers shared by the store and the forms.

pub mod slug;

pub use slug::{slug_from_title, MAX_SLUG_LEN};
