pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use types::{
    flatten_chapter_trees, Book, BookId, BookType, Chapter, ChapterMarks, ChapterName,
    ChapterTree, Duration, Timestamp, Validator,
};
