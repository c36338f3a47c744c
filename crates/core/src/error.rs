//! Error type shared by the Audioshelf crates
//!
//! Lookups that find nothing are not errors; they return `Option`.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// A query or connection failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// `PRAGMA integrity_check` reported problems
    #[error("Database corrupted: {details}")]
    DatabaseCorrupted { details: String },

    /// Schema migration failed; the version was rolled back
    #[error("Migration {version} failed: {reason}")]
    MigrationFailed {
        version: i64,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A row that a write targets does not exist
    #[error("Record not found: {entity} with {identifier}")]
    RecordNotFound { entity: String, identifier: String },

    /// A stored value could not be read back (book type, chapter marks)
    #[error("Invalid metadata: {field} has invalid value '{value}'")]
    InvalidMetadata { field: String, value: String },

    /// A value handed to the library cannot be stored
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    /// Short message for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError { .. } | Self::Io(_) => {
                "Your library could not be read or saved. Please try again.".to_string()
            }
            Self::DatabaseCorrupted { .. } => "Your library is damaged and needs repair.".to_string(),
            Self::MigrationFailed { .. } => {
                "Your library could not be updated to the new version.".to_string()
            }
            Self::RecordNotFound { .. } => "The requested book was not found.".to_string(),
            Self::InvalidMetadata { field, .. } => {
                format!("A stored {} could not be read.", field)
            }
            Self::InvalidArgument { argument, reason } => format!("Invalid {}: {}.", argument, reason),
        }
    }

    /// Helper to create a database error from any error type
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a migration error from any error type
    pub fn migration<E: std::error::Error + Send + Sync + 'static>(
        version: i64,
        reason: impl Into<String>,
        source: E,
    ) -> Self {
        Self::MigrationFailed {
            version,
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
