//! Domain types for Audioshelf
//!
//! - `book`: books, chapters and chapter marks
//! - `chapter_tree`: nested, multi-language chapter records from containers
//! - `common`: durations, timestamps and validation

mod book;
mod chapter_tree;
mod common;

pub use book::{Book, BookId, BookType, Chapter, ChapterMarks};
pub use chapter_tree::{flatten_chapter_trees, ChapterName, ChapterTree};
pub use common::{Duration, Timestamp, Validator};
