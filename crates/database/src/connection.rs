//! Opening the library database

use audioshelf_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

pub type DbPool = Pool<Sqlite>;

/// Writes are serialized by the repository, so a few readers are enough
const MAX_CONNECTIONS: u32 = 4;

/// How long a statement waits on a locked file before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the database file at `path`, creating it when missing
///
/// Connections use WAL and enforce foreign keys, so chapters follow their
/// book on delete.
pub async fn connect(path: impl AsRef<Path>) -> Result<DbPool, AppError> {
    let path = path.as_ref();
    if path.exists() {
        log::info!("Opening library database {}", path.display());
    } else {
        log::info!("Creating library database {}", path.display());
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database(format!("Cannot open {}", path.display()), e))
}

/// A private in-memory database on a single connection
#[cfg(test)]
pub async fn create_test_db() -> Result<DbPool, AppError> {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| AppError::database("Failed to create test database", e))?
        .journal_mode(SqliteJournalMode::Memory)
        .foreign_keys(true);

    // Every extra connection would see its own empty database
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Failed to connect to test database", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_creates_file_in_wal_mode() -> Result<(), AppError> {
        let dir = TempDir::new()?;
        let path = dir.path().join("library.db");

        let pool = connect(&path).await?;
        assert!(path.exists());

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode;")
            .fetch_one(&pool)
            .await
            .map_err(|e| AppError::database("pragma", e))?;
        assert_eq!(mode.to_lowercase(), "wal");

        pool.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() -> Result<(), AppError> {
        let dir = TempDir::new()?;
        let pool = connect(dir.path().join("library.db")).await?;

        let (enabled,): (i32,) = sqlx::query_as("PRAGMA foreign_keys;")
            .fetch_one(&pool)
            .await
            .map_err(|e| AppError::database("pragma", e))?;
        assert_eq!(enabled, 1);

        pool.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_directory_is_database_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("library.db");

        let result = connect(&path).await;
        assert!(matches!(result, Err(AppError::DatabaseError { .. })));
    }
}
