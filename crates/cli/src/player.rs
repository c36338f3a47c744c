use audioshelf_library::{BookRepository, CurrentBookPreference, PlayerController};
use console::style;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reports what would start playing instead of driving an audio engine
pub struct ConsolePlayer {
    repository: Arc<BookRepository>,
    preference: Arc<dyn CurrentBookPreference>,
    played: AtomicBool,
}

impl ConsolePlayer {
    pub fn new(repository: Arc<BookRepository>, preference: Arc<dyn CurrentBookPreference>) -> Self {
        Self {
            repository,
            preference,
            played: AtomicBool::new(false),
        }
    }

    /// Whether `play` has been called
    pub fn played(&self) -> bool {
        self.played.load(Ordering::SeqCst)
    }
}

impl PlayerController for ConsolePlayer {
    fn play(&self) {
        self.played.store(true, Ordering::SeqCst);
        let current = self
            .preference
            .current_book_id()
            .and_then(|id| self.repository.book_by_id(id));

        match current {
            Some(book) => {
                let chapter = book
                    .current_chapter()
                    .map(|c| c.name.as_str())
                    .unwrap_or("-");
                println!(
                    "{} Playing {} ({} at {})",
                    style("▶").green().bold(),
                    style(&book.name).bold(),
                    chapter,
                    book.position.as_hms()
                );
            }
            None => println!("{} Nothing to play", style("▶").dim()),
        }
    }
}
