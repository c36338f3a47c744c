use audioshelf_config::ConfigError;
use audioshelf_core::error::AppError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] AppError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("No chapter plays {}", .0.display())]
    ChapterNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => e.user_message(),
            Self::Config(_) => "Your settings could not be read or saved.".to_string(),
            Self::BookNotFound(id) => format!("No book with id {} in the library.", id),
            Self::ChapterNotFound(file) => {
                format!("No chapter of that book plays {}.", file.display())
            }
            Self::Io(_) => "A file operation failed. Please try again.".to_string(),
        }
    }
}

// Both type aliases for convenience
pub type Result<T> = std::result::Result<T, LibraryError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
