use crate::error::{LibraryError, Result};
use crate::player::PlayerController;
use crate::preferences::{ConfigPreferences, CurrentBookPreference};
use crate::repository::BookRepository;
use crate::search::BookSearchHandler;
use audioshelf_config::{Config, ConfigManager};
use audioshelf_core::{flatten_chapter_trees, Book, BookId, ChapterMarks, ChapterTree, Duration};
use audioshelf_database::{
    connect, optimize, run_migrations, verify_integrity, DbPool, SqliteBookStorage,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Opens the database and wires the repository, preference and search
/// handler together
pub struct LibraryManager {
    pool: DbPool,
    config: Config,
    repository: Arc<BookRepository>,
    preferences: Arc<dyn CurrentBookPreference>,
}

impl LibraryManager {
    /// Opens the library described by the config in `config_manager`
    ///
    /// Environment overrides apply. The current book is stored in the same
    /// config file.
    pub async fn open(config_manager: Arc<ConfigManager>) -> Result<Self> {
        let config = config_manager.load_with_env_overrides()?;
        let database_path = config_manager.database_path(&config);
        let preferences = Arc::new(ConfigPreferences::new(config_manager));
        Self::with_database(database_path, config, preferences).await
    }

    /// Opens the database at `path`, creating it and its parent directory
    /// if needed, and brings the schema up to date
    pub async fn with_database(
        path: impl AsRef<Path>,
        config: Config,
        preferences: Arc<dyn CurrentBookPreference>,
    ) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let pool = connect(path).await?;
        run_migrations(&pool).await?;

        let storage = Arc::new(SqliteBookStorage::new(pool.clone()));
        let repository = Arc::new(BookRepository::new(storage).await?);

        Ok(Self {
            pool,
            config,
            repository,
            preferences,
        })
    }

    pub fn repository(&self) -> &Arc<BookRepository> {
        &self.repository
    }

    pub fn preferences(&self) -> &Arc<dyn CurrentBookPreference> {
        &self.preferences
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Languages to prefer when naming chapters from embedded chapter trees
    pub fn preferred_languages(&self) -> &[String] {
        &self.config.library.preferred_chapter_languages
    }

    /// Marks for a file's embedded chapter forest, named in the configured
    /// languages
    pub fn chapter_marks(&self, trees: &[ChapterTree]) -> ChapterMarks {
        flatten_chapter_trees(trees, self.preferred_languages())
    }

    /// Replaces the marks of the chapter backed by `file` in book `id`
    pub async fn set_chapter_marks(
        &self,
        id: BookId,
        file: &Path,
        trees: &[ChapterTree],
    ) -> Result<()> {
        let mut book = self.book(id)?;
        let marks = self.chapter_marks(trees);
        let chapter = book
            .chapters
            .iter_mut()
            .find(|c| c.file == file)
            .ok_or_else(|| LibraryError::ChapterNotFound(file.to_path_buf()))?;
        chapter.marks = marks;

        Ok(self.repository.update_book(book).await?)
    }

    /// Builds a search handler that plays through `player`
    pub fn search_handler(&self, player: Arc<dyn PlayerController>) -> BookSearchHandler {
        BookSearchHandler::new(
            self.repository.clone(),
            self.preferences.clone(),
            player,
        )
    }

    /// Active book with `id`
    pub fn book(&self, id: BookId) -> Result<Book> {
        self.repository
            .active_books()
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| LibraryError::BookNotFound(id.to_string()))
    }

    /// The book the preference points at, if it is still active
    pub fn current_book(&self) -> Option<Book> {
        self.preferences
            .current_book_id()
            .and_then(|id| self.repository.book_by_id(id))
    }

    pub async fn add_book(&self, book: Book) -> Result<()> {
        Ok(self.repository.add_book(book).await?)
    }

    /// Hides the active books with the given ids
    ///
    /// Fails without hiding anything if one of the ids is not active.
    pub async fn hide_books(&self, ids: &[BookId]) -> Result<()> {
        let active = self.repository.active_books();
        let books = ids
            .iter()
            .map(|id| {
                active
                    .iter()
                    .find(|b| b.id == *id)
                    .cloned()
                    .ok_or_else(|| LibraryError::BookNotFound(id.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.repository.hide_book(books).await?)
    }

    /// Restores an orphaned book
    pub async fn reveal_book(&self, id: BookId) -> Result<Book> {
        let book = self
            .repository
            .orphaned_books()
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| LibraryError::BookNotFound(id.to_string()))?;

        self.repository.reveal_book(book.clone()).await?;
        Ok(book)
    }

    pub fn stats(&self) -> LibraryStats {
        let active = self.repository.active_books();
        let total_ms: u64 = active.iter().map(|b| b.total_duration().as_millis()).sum();
        let unique_authors = active
            .iter()
            .filter_map(|b| b.author.as_deref())
            .collect::<HashSet<_>>()
            .len();

        LibraryStats {
            active_books: active.len(),
            orphaned_books: self.repository.orphaned_books().len(),
            total_duration: Duration::from_millis(total_ms),
            unique_authors,
        }
    }

    /// Checks the database file and refreshes query planner statistics
    pub async fn check_database(&self) -> Result<()> {
        verify_integrity(&self.pool).await?;
        optimize(&self.pool).await?;
        Ok(())
    }

    /// Get database pool for advanced operations
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[derive(Debug, Clone)]
pub struct LibraryStats {
    pub active_books: usize,
    pub orphaned_books: usize,
    pub total_duration: Duration,
    pub unique_authors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioshelf_config::LibraryConfig;
    use audioshelf_core::{BookType, Chapter, ChapterName, Timestamp};
    use std::path::PathBuf;
    use tempfile::TempDir;

    async fn setup_test_manager() -> Result<(LibraryManager, TempDir)> {
        let temp_dir = TempDir::new()?;
        let config_manager = Arc::new(ConfigManager::with_directory(
            temp_dir.path().to_path_buf(),
        )?);
        let manager = LibraryManager::open(config_manager).await?;
        Ok((manager, temp_dir))
    }

    fn test_book(name: &str, author: &str) -> Book {
        let root = PathBuf::from("/books").join(name);
        let chapter = Chapter::new(
            root.join("01.mp3"),
            "Chapter 1".to_string(),
            Duration::from_seconds(60),
            Timestamp::EPOCH,
        );
        Book::new(name.to_string(), BookType::SingleFolder, root, vec![chapter]).with_author(author)
    }

    #[tokio::test]
    async fn test_manager_creation() -> Result<()> {
        let (manager, temp_dir) = setup_test_manager().await?;
        assert!(temp_dir.path().join("audioshelf.db").exists());
        assert!(manager.repository().active_books().is_empty());
        assert_eq!(manager.preferred_languages(), ["en".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_check_database() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        manager.add_book(test_book("Dune", "Frank Herbert")).await?;
        manager.check_database().await?;
        manager.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_get_nonexistent_book() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        let result = manager.book(BookId::new());
        assert!(matches!(result, Err(LibraryError::BookNotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_hide_unknown_id_hides_nothing() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        let book = test_book("Dune", "Frank Herbert");
        manager.add_book(book.clone()).await?;

        let result = manager.hide_books(&[book.id, BookId::new()]).await;
        assert!(matches!(result, Err(LibraryError::BookNotFound(_))));
        assert_eq!(manager.repository().active_books(), vec![book]);
        Ok(())
    }

    #[tokio::test]
    async fn test_hide_then_reveal_by_id() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        let book = test_book("Dune", "Frank Herbert");
        manager.add_book(book.clone()).await?;

        manager.hide_books(&[book.id]).await?;
        assert!(manager.book(book.id).is_err());
        assert_eq!(manager.stats().orphaned_books, 1);

        let revealed = manager.reveal_book(book.id).await?;
        assert_eq!(revealed, book);
        assert_eq!(manager.book(book.id)?, book);
        Ok(())
    }

    #[tokio::test]
    async fn test_reveal_unknown_id() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        let result = manager.reveal_book(BookId::new()).await;
        assert!(matches!(result, Err(LibraryError::BookNotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_current_book_follows_preference() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        let book = test_book("Dune", "Frank Herbert");
        manager.add_book(book.clone()).await?;
        assert_eq!(manager.current_book(), None);

        manager.preferences().set_current_book_id(book.id)?;
        assert_eq!(manager.current_book(), Some(book.clone()));

        manager.hide_books(&[book.id]).await?;
        assert_eq!(manager.current_book(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_stats() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        manager.add_book(test_book("Dune", "Frank Herbert")).await?;
        manager.add_book(test_book("Children of Dune", "Frank Herbert")).await?;
        manager.add_book(test_book("Emma", "Jane Austen")).await?;

        let stats = manager.stats();
        assert_eq!(stats.active_books, 3);
        assert_eq!(stats.orphaned_books, 0);
        assert_eq!(stats.total_duration, Duration::from_seconds(180));
        assert_eq!(stats.unique_authors, 2);
        Ok(())
    }

    fn bilingual_chapters() -> Vec<ChapterTree> {
        let scene = ChapterTree::new(
            Duration::from_seconds(90),
            vec![
                ChapterName::new("Die Ankunft", ["de"]),
                ChapterName::new("The Arrival", ["en"]),
            ],
            Vec::new(),
        );
        vec![ChapterTree::new(
            Duration::ZERO,
            vec![
                ChapterName::new("Teil Eins", ["de"]),
                ChapterName::new("Part One", ["en"]),
            ],
            vec![scene],
        )]
    }

    #[tokio::test]
    async fn test_chapter_marks_use_configured_languages() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_manager = Arc::new(ConfigManager::with_directory(
            temp_dir.path().to_path_buf(),
        )?);
        config_manager.update(|config| {
            config.library = LibraryConfig {
                preferred_chapter_languages: vec!["de".to_string(), "en".to_string()],
            }
        })?;
        let manager = LibraryManager::open(config_manager).await?;

        let marks = manager.chapter_marks(&bilingual_chapters());
        assert_eq!(marks.get(Duration::ZERO), Some("Teil Eins"));
        assert_eq!(marks.get(Duration::from_seconds(90)), Some("Die Ankunft"));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_chapter_marks_stores_them_on_the_chapter() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        let book = test_book("Dune", "Frank Herbert");
        let file = book.chapters[0].file.clone();
        manager.add_book(book.clone()).await?;

        manager
            .set_chapter_marks(book.id, &file, &bilingual_chapters())
            .await?;

        let chapter = manager
            .repository()
            .chapter_by_file(&file)
            .ok_or_else(|| LibraryError::ChapterNotFound(file.clone()))?;
        let names: Vec<_> = chapter.marks.iter().map(|(_, name)| name).collect();
        assert_eq!(names, ["Part One", "The Arrival"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_chapter_marks_unknown_file() -> Result<()> {
        let (manager, _temp) = setup_test_manager().await?;
        let book = test_book("Dune", "Frank Herbert");
        manager.add_book(book.clone()).await?;

        let result = manager
            .set_chapter_marks(book.id, Path::new("/books/Dune/99.mp3"), &bilingual_chapters())
            .await;
        assert!(matches!(result, Err(LibraryError::ChapterNotFound(_))));
        Ok(())
    }
}
