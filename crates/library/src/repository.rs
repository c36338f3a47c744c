//! In-memory view of the library backed by durable storage
//!
//! The repository keeps two lists: active books, sorted by name, and
//! orphaned books whose files have gone missing. Every change to the
//! active list is published to subscribers of [`BookRepository::books_stream`].
//!
//! Mutations are serialized by an async write gate and always write to
//! storage before touching memory, so a failed write leaves the repository
//! as it was. Reads only take a short synchronous lock and never wait on
//! storage.

use audioshelf_core::{Book, BookId, Chapter, Result};
use audioshelf_database::BookStorage;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio_stream::wrappers::WatchStream;

#[derive(Debug, Default)]
struct Shelves {
    active: Vec<Book>,
    orphaned: Vec<Book>,
}

pub struct BookRepository {
    storage: Arc<dyn BookStorage>,
    write_gate: AsyncMutex<()>,
    shelves: Mutex<Shelves>,
    active_tx: watch::Sender<Vec<Book>>,
}

impl BookRepository {
    /// Loads both lists from `storage`
    pub async fn new(storage: Arc<dyn BookStorage>) -> Result<Self> {
        let mut active = storage.active_books().await?;
        let orphaned = storage.orphaned_books().await?;
        active.sort_by(Book::compare_by_name);

        log::debug!(
            "Loaded {} active and {} orphaned books",
            active.len(),
            orphaned.len()
        );

        let (active_tx, _) = watch::channel(active.clone());

        Ok(Self {
            storage,
            write_gate: AsyncMutex::new(()),
            shelves: Mutex::new(Shelves { active, orphaned }),
            active_tx,
        })
    }

    /// Current active list, then every later one
    pub fn books_stream(&self) -> WatchStream<Vec<Book>> {
        WatchStream::new(self.active_tx.subscribe())
    }

    /// The active book with `id` after every change, `None` while there is none
    pub fn by_id(&self, id: BookId) -> impl Stream<Item = Option<Book>> + Send + 'static {
        self.books_stream()
            .map(move |books| books.into_iter().find(|b| b.id == id))
    }

    pub async fn add_book(&self, book: Book) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        log::trace!("add_book {} ({})", book.name, book.id);

        self.storage.add_book(&book).await?;
        self.mutate(|shelves| shelves.active.push(book));
        Ok(())
    }

    /// Replaces the active book with the same id
    ///
    /// Equal values are ignored. An id that is not active is logged and
    /// otherwise ignored.
    pub async fn update_book(&self, book: Book) -> Result<()> {
        let _gate = self.write_gate.lock().await;

        let current = self.book_by_id(book.id);
        match current {
            Some(current) if current == book => return Ok(()),
            Some(_) => {}
            None => {
                log::error!("update failed as there was no book {}", book.id);
                return Ok(());
            }
        }

        log::trace!("update_book {} ({})", book.name, book.id);
        self.storage.update_book(&book).await?;
        self.mutate(|shelves| {
            if let Some(slot) = shelves.active.iter_mut().find(|b| b.id == book.id) {
                *slot = book;
            }
        });
        Ok(())
    }

    /// Moves `books` from the active list to the orphaned list
    pub async fn hide_book(&self, books: Vec<Book>) -> Result<()> {
        if books.is_empty() {
            return Ok(());
        }

        let _gate = self.write_gate.lock().await;
        log::trace!("hide_book count={}", books.len());

        let ids: Vec<BookId> = books.iter().map(|b| b.id).collect();
        self.storage.hide_books(&ids).await?;
        self.mutate(|shelves| {
            shelves.active.retain(|b| !ids.contains(&b.id));
            shelves.orphaned.retain(|b| !ids.contains(&b.id));
            shelves.orphaned.extend(books);
        });
        Ok(())
    }

    /// Makes `book` active again
    pub async fn reveal_book(&self, book: Book) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        log::trace!("reveal_book {} ({})", book.name, book.id);

        self.storage.reveal_book(&book).await?;
        self.mutate(|shelves| {
            shelves.orphaned.retain(|b| b.id != book.id);
            shelves.active.retain(|b| b.id != book.id);
            shelves.active.push(book);
        });
        Ok(())
    }

    pub fn active_books(&self) -> Vec<Book> {
        self.shelves.lock().active.clone()
    }

    pub fn book_by_id(&self, id: BookId) -> Option<Book> {
        self.shelves
            .lock()
            .active
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    pub fn orphaned_books(&self) -> Vec<Book> {
        self.shelves.lock().orphaned.clone()
    }

    /// First chapter backed by `file`, looking at active books before
    /// orphaned ones
    pub fn chapter_by_file(&self, file: &Path) -> Option<Chapter> {
        let shelves = self.shelves.lock();
        shelves
            .active
            .iter()
            .chain(shelves.orphaned.iter())
            .find_map(|book| book.chapter_by_file(file))
            .cloned()
    }

    /// Applies an in-memory change, resorts and publishes the active list
    fn mutate(&self, change: impl FnOnce(&mut Shelves)) {
        let snapshot = {
            let mut shelves = self.shelves.lock();
            change(&mut shelves);
            shelves.active.sort_by(Book::compare_by_name);
            shelves.active.clone()
        };
        self.active_tx.send_replace(snapshot);
    }
}

impl std::fmt::Debug for BookRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shelves = self.shelves.lock();
        f.debug_struct("BookRepository")
            .field("active", &shelves.active.len())
            .field("orphaned", &shelves.orphaned.len())
            .finish()
    }
}
