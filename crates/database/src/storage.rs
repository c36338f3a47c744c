//! Persistent book storage
//!
//! [`BookStorage`] is the seam between the in-memory library and the
//! database. The library only ever talks to this trait, so tests can swap
//! in a fake.

use crate::queries::books;
use crate::DbPool;
use async_trait::async_trait;
use audioshelf_core::{AppError, Book, BookId};

#[async_trait]
pub trait BookStorage: Send + Sync {
    /// Books visible in the library
    async fn active_books(&self) -> Result<Vec<Book>, AppError>;

    /// Books that were hidden because their files disappeared
    async fn orphaned_books(&self) -> Result<Vec<Book>, AppError>;

    async fn add_book(&self, book: &Book) -> Result<(), AppError>;

    async fn update_book(&self, book: &Book) -> Result<(), AppError>;

    async fn hide_book(&self, id: BookId) -> Result<(), AppError>;

    /// Stores `book` and marks it active again
    async fn reveal_book(&self, book: &Book) -> Result<(), AppError>;

    /// Hides several books at once
    async fn hide_books(&self, ids: &[BookId]) -> Result<(), AppError> {
        for id in ids {
            self.hide_book(*id).await?;
        }
        Ok(())
    }
}

/// [`BookStorage`] backed by the SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteBookStorage {
    pool: DbPool,
}

impl SqliteBookStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl BookStorage for SqliteBookStorage {
    async fn active_books(&self) -> Result<Vec<Book>, AppError> {
        books::list_books(&self.pool, true).await
    }

    async fn orphaned_books(&self) -> Result<Vec<Book>, AppError> {
        books::list_books(&self.pool, false).await
    }

    async fn add_book(&self, book: &Book) -> Result<(), AppError> {
        books::create_book(&self.pool, book).await
    }

    async fn update_book(&self, book: &Book) -> Result<(), AppError> {
        books::update_book(&self.pool, book).await
    }

    async fn hide_book(&self, id: BookId) -> Result<(), AppError> {
        books::hide_book(&self.pool, id).await
    }

    async fn reveal_book(&self, book: &Book) -> Result<(), AppError> {
        books::reveal_book(&self.pool, book).await
    }

    async fn hide_books(&self, ids: &[BookId]) -> Result<(), AppError> {
        books::hide_books(&self.pool, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_test_db;
    use crate::migrations::run_migrations;
    use audioshelf_core::{BookType, Chapter, Duration, Timestamp};
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn book(name: &str) -> Book {
        let root = PathBuf::from("/books").join(name);
        Book::new(
            name.to_string(),
            BookType::CollectionFile,
            root.clone(),
            vec![Chapter::new(
                root,
                name.to_string(),
                Duration::from_seconds(60),
                Timestamp::EPOCH,
            )],
        )
    }

    async fn storage() -> SqliteBookStorage {
        let pool = create_test_db().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBookStorage::new(pool)
    }

    #[tokio::test]
    async fn test_sqlite_storage_round_trip() {
        let storage = storage().await;
        let first = book("First");
        let second = book("Second");

        storage.add_book(&first).await.unwrap();
        storage.add_book(&second).await.unwrap();
        storage.hide_books(&[second.id]).await.unwrap();

        assert_eq!(storage.active_books().await.unwrap(), vec![first]);
        assert_eq!(storage.orphaned_books().await.unwrap(), vec![second.clone()]);

        storage.reveal_book(&second).await.unwrap();
        assert!(storage.orphaned_books().await.unwrap().is_empty());
    }

    /// Records hide calls to check the default batch implementation
    struct RecordingStorage {
        hidden: Mutex<Vec<BookId>>,
    }

    #[async_trait]
    impl BookStorage for RecordingStorage {
        async fn active_books(&self) -> Result<Vec<Book>, AppError> {
            Ok(Vec::new())
        }

        async fn orphaned_books(&self) -> Result<Vec<Book>, AppError> {
            Ok(Vec::new())
        }

        async fn add_book(&self, _book: &Book) -> Result<(), AppError> {
            Ok(())
        }

        async fn update_book(&self, _book: &Book) -> Result<(), AppError> {
            Ok(())
        }

        async fn hide_book(&self, id: BookId) -> Result<(), AppError> {
            self.hidden.lock().unwrap().push(id);
            Ok(())
        }

        async fn reveal_book(&self, _book: &Book) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_hide_books_hides_each_in_order() {
        let storage = RecordingStorage {
            hidden: Mutex::new(Vec::new()),
        };
        let ids = [BookId::new(), BookId::new(), BookId::new()];

        storage.hide_books(&ids).await.unwrap();

        assert_eq!(*storage.hidden.lock().unwrap(), ids.to_vec());
    }
}
