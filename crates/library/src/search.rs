//! Voice search: resolve a spoken request to a book and start playing it
//!
//! Requests come from media sessions (car head units, voice assistants) and
//! carry an optional free-text query plus an optional focus telling what
//! kind of item was asked for. All matching is exact and case-sensitive
//! against the active books.

use crate::error::Result;
use crate::player::PlayerController;
use crate::preferences::CurrentBookPreference;
use crate::repository::BookRepository;
use audioshelf_core::Book;
use std::sync::Arc;

pub const FOCUS_ARTIST: &str = "vnd.android.cursor.item/artist";
pub const FOCUS_ALBUM: &str = "vnd.android.cursor.item/album";
pub const FOCUS_PLAYLIST: &str = "vnd.android.cursor.item/playlist";
pub const FOCUS_ANY: &str = "vnd.android.cursor.item/*";

/// A search request; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSearch {
    pub query: Option<String>,
    /// Raw media focus string, see [`MediaFocus::parse`]
    pub media_focus: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub playlist: Option<String>,
}

/// What kind of item a search is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFocus {
    Artist,
    Album,
    Playlist,
    Any,
}

impl MediaFocus {
    /// Recognizes the media session focus strings; anything else is `None`
    pub fn parse(focus: &str) -> Option<Self> {
        match focus {
            FOCUS_ARTIST => Some(Self::Artist),
            FOCUS_ALBUM => Some(Self::Album),
            FOCUS_PLAYLIST => Some(Self::Playlist),
            FOCUS_ANY => Some(Self::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artist => FOCUS_ARTIST,
            Self::Album => FOCUS_ALBUM,
            Self::Playlist => FOCUS_PLAYLIST,
            Self::Any => FOCUS_ANY,
        }
    }
}

pub struct BookSearchHandler {
    repository: Arc<BookRepository>,
    preference: Arc<dyn CurrentBookPreference>,
    player: Arc<dyn PlayerController>,
}

impl BookSearchHandler {
    pub fn new(
        repository: Arc<BookRepository>,
        preference: Arc<dyn CurrentBookPreference>,
        player: Arc<dyn PlayerController>,
    ) -> Self {
        Self {
            repository,
            preference,
            player,
        }
    }

    /// Resolves `search` against the active books
    ///
    /// On a hit the book becomes current and playback starts. A miss does
    /// nothing, except for the `Any` focus which always starts playback.
    pub fn handle(&self, search: &BookSearch) -> Result<()> {
        log::debug!("handle {:?}", search);
        let books = self.repository.active_books();

        let focus = search.media_focus.as_deref().and_then(MediaFocus::parse);
        match focus {
            Some(MediaFocus::Any) => {
                if let Some(book) = search
                    .query
                    .as_deref()
                    .and_then(|query| find_unstructured(&books, query))
                {
                    self.preference.set_current_book_id(book.id)?;
                }
                self.player.play();
                Ok(())
            }
            Some(focus) => self.play_if_found(find_focused(&books, focus, search)),
            None => self.play_if_found(
                search
                    .query
                    .as_deref()
                    .and_then(|query| find_unstructured(&books, query)),
            ),
        }
    }

    fn play_if_found(&self, book: Option<&Book>) -> Result<()> {
        match book {
            Some(book) => {
                log::info!("Playing {} found by search", book.name);
                self.preference.set_current_book_id(book.id)?;
                self.player.play();
            }
            None => log::debug!("No book matched the search"),
        }
        Ok(())
    }
}

/// Book name, then author, then any chapter name
fn find_unstructured<'a>(books: &'a [Book], query: &str) -> Option<&'a Book> {
    books
        .iter()
        .find(|b| b.name == query)
        .or_else(|| books.iter().find(|b| b.author.as_deref() == Some(query)))
        .or_else(|| {
            books
                .iter()
                .find(|b| b.chapters.iter().any(|c| c.name == query))
        })
}

fn find_focused<'a>(books: &'a [Book], focus: MediaFocus, search: &BookSearch) -> Option<&'a Book> {
    let artist_matches =
        |book: &Book| search.artist.is_none() || book.author.as_deref() == search.artist.as_deref();

    match focus {
        MediaFocus::Artist => {
            let artist = search.artist.as_deref()?;
            books.iter().find(|b| b.author.as_deref() == Some(artist))
        }
        MediaFocus::Album => {
            let album = search.album.as_deref()?;
            books.iter().find(|&b| b.name == album && artist_matches(b))
        }
        MediaFocus::Playlist => {
            let playlist = search.playlist.as_deref().or(search.album.as_deref())?;
            books.iter().find(|&b| {
                b.name == playlist
                    && artist_matches(b)
                    && search.album.as_deref().is_none_or(|album| b.name == album)
            })
        }
        MediaFocus::Any => None,
    }
}
