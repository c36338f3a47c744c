//! Database query operations organized by entity

use audioshelf_core::AppError;
use std::path::Path;

pub mod books;
pub mod chapters;

/// Paths are stored as TEXT, so one that is not UTF-8 cannot be written
/// without changing it
pub(crate) fn path_text<'a>(path: &'a Path, argument: &str) -> Result<&'a str, AppError> {
    path.to_str().ok_or_else(|| AppError::InvalidArgument {
        argument: argument.to_string(),
        reason: format!("{} is not valid UTF-8", path.display()),
    })
}

// Re-export commonly used query functions
pub use books::{
    create_book, get_book, hide_book, hide_books, list_books, reveal_book, set_active, update_book,
};
pub use chapters::{chapters_by_book, get_book_chapters};
