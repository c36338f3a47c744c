//! Audioshelf Library
//!
//! Keeps the in-memory view of the audiobook library in sync with the
//! database and answers voice search requests against it.
//!
//! - [`BookRepository`]: active and orphaned books, with change streams
//! - [`BookSearchHandler`]: resolves a [`BookSearch`] and starts playback
//! - [`LibraryManager`]: opens the database and wires everything together

pub mod error;
pub mod manager;
pub mod player;
pub mod preferences;
pub mod repository;
pub mod search;

pub use error::{LibraryError, LibraryResult};
pub use manager::{LibraryManager, LibraryStats};
pub use player::PlayerController;
pub use preferences::{ConfigPreferences, CurrentBookPreference};
pub use repository::BookRepository;
pub use search::{BookSearch, BookSearchHandler, MediaFocus};
