//! The "current book" preference shared by the player and the search handler

use crate::error::Result;
use audioshelf_config::ConfigManager;
use audioshelf_core::BookId;
use std::sync::Arc;

pub trait CurrentBookPreference: Send + Sync {
    fn current_book_id(&self) -> Option<BookId>;

    fn set_current_book_id(&self, id: BookId) -> Result<()>;
}

/// Stores the current book as `playback.current_book_id` in the config file
pub struct ConfigPreferences {
    manager: Arc<ConfigManager>,
}

impl ConfigPreferences {
    pub fn new(manager: Arc<ConfigManager>) -> Self {
        Self { manager }
    }
}

impl CurrentBookPreference for ConfigPreferences {
    fn current_book_id(&self) -> Option<BookId> {
        self.manager.load_or_default().playback.current_book_id
    }

    fn set_current_book_id(&self, id: BookId) -> Result<()> {
        log::debug!("current book is now {}", id);
        self.manager
            .update(|config| config.playback.current_book_id = Some(id))?;
        Ok(())
    }
}
