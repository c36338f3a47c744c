use crate::player::ConsolePlayer;
use anyhow::{bail, Context, Result};
use audioshelf_config::ConfigManager;
use audioshelf_core::{Book, BookId, BookType, Chapter, Duration, Timestamp};
use audioshelf_library::search::{FOCUS_ALBUM, FOCUS_ANY, FOCUS_ARTIST, FOCUS_PLAYLIST};
use audioshelf_library::{BookSearch, LibraryError, LibraryManager};
use clap::ArgMatches;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub async fn show_init(
    library: &LibraryManager,
    config_manager: &ConfigManager,
    db_path: &Path,
) -> Result<()> {
    library
        .check_database()
        .await
        .context("Database integrity check failed")?;

    println!("{} Library ready", style("✓").green().bold());
    println!("  Config: {}", config_manager.config_path().display());
    println!("  Database: {}", db_path.display());
    Ok(())
}

/// List active books
pub fn list_books(library: &LibraryManager) {
    let books = library.repository().active_books();

    if books.is_empty() {
        println!("No books in library. Use the 'add' command to add audiobooks.");
        return;
    }

    println!("\n{} Books in Library", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for book in &books {
        print_book_summary(book);
    }
}

pub fn list_orphaned(library: &LibraryManager) {
    let books = library.repository().orphaned_books();

    if books.is_empty() {
        println!("No hidden books.");
        return;
    }

    println!("\n{} Hidden Books", style(books.len()).bold().yellow());
    println!("{}", "=".repeat(80));

    for book in &books {
        print_book_summary(book);
    }
}

/// Add a book built from the given chapter files
pub async fn add_book(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let root = matches
        .get_one::<String>("root")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Book root is required"))?;

    let files: Vec<PathBuf> = matches
        .get_many::<String>("chapters")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();

    let book_type: BookType = matches
        .get_one::<String>("type")
        .map(|s| s.parse::<BookType>())
        .transpose()
        .context("Invalid book type")?
        .unwrap_or(BookType::SingleFolder);

    let name = matches
        .get_one::<String>("name")
        .cloned()
        .unwrap_or_else(|| default_name(&root));

    let chapters = chapters_from_files(&files)?;
    let mut book = Book::new(name, book_type, root, chapters);
    book.author = matches.get_one::<String>("author").cloned();

    library
        .add_book(book.clone())
        .await
        .context("Failed to add book to library")?;

    println!("{} Book added successfully!", style("✓").green().bold());
    println!("  ID: {}", book.id);
    println!("  Name: {}", book.name);
    if let Some(author) = &book.author {
        println!("  Author: {}", author);
    }
    println!("  Chapters: {}", book.chapters.len());

    Ok(())
}

pub async fn hide_books(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let ids = matches
        .get_many::<String>("ids")
        .map(|values| values.map(|s| parse_book_id(s)).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    library
        .hide_books(&ids)
        .await
        .context("Failed to hide books")?;

    println!("{} Hid {} book(s)", style("✓").green().bold(), ids.len());
    Ok(())
}

pub async fn reveal_book(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow::anyhow!("Book ID is required"))
        .and_then(|s| parse_book_id(s))?;

    let book = library
        .reveal_book(id)
        .await
        .context("Failed to reveal book")?;

    println!("{} Restored '{}'", style("✓").green().bold(), book.name);
    Ok(())
}

pub fn show_chapter(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let file = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("File is required"))?;

    let Some(chapter) = library.repository().chapter_by_file(&file) else {
        println!("No chapter stored for {}", file.display());
        return Ok(());
    };

    println!("\n{}", style(&chapter.name).bold());
    println!("  File: {}", chapter.file.display());
    println!("  Duration: {}", chapter.duration.as_hms());
    println!("  Modified: {}", chapter.file_last_modified.as_millis());
    if !chapter.marks.is_empty() {
        println!("  Marks:");
        for (position, name) in chapter.marks.iter() {
            println!("    {} {}", style(position.as_hms()).dim(), name);
        }
    }

    Ok(())
}

/// Run a voice-style search and report what happened
pub fn search(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let arg = |name: &str| matches.get_one::<String>(name).cloned();
    let request = BookSearch {
        query: arg("query"),
        media_focus: arg("focus").map(|f| media_focus(&f)),
        artist: arg("artist"),
        album: arg("album"),
        playlist: arg("playlist"),
    };

    let player = Arc::new(ConsolePlayer::new(
        library.repository().clone(),
        library.preferences().clone(),
    ));
    library
        .search_handler(player.clone())
        .handle(&request)
        .context("Search failed")?;

    if !player.played() {
        println!("No book matched the search");
    }
    Ok(())
}

pub fn show_current(library: &LibraryManager) {
    match library.current_book() {
        Some(book) => print_book_summary(&book),
        None => println!("No current book"),
    }
}

pub fn show_stats(library: &LibraryManager) {
    let stats = library.stats();

    println!("\n{}", style("Library Statistics").bold().cyan());
    println!("{}", "=".repeat(40));
    println!("Active Books: {}", style(stats.active_books).bold());
    println!("Hidden Books: {}", style(stats.orphaned_books).bold());
    println!("Authors: {}", style(stats.unique_authors).bold());
    println!(
        "Total Duration: {}",
        style(format_duration(stats.total_duration.as_seconds())).bold()
    );
}

/// Text for the user when `err` came out of the library
pub fn user_message(err: &anyhow::Error) -> Option<String> {
    err.downcast_ref::<LibraryError>()
        .map(LibraryError::user_message)
}

fn print_book_summary(book: &Book) {
    println!("\n{}", style(&book.name).bold());
    println!("  ID: {}", book.id);
    if let Some(author) = &book.author {
        println!("  Author: {}", author);
    }
    println!("  Type: {}", book.book_type);
    println!("  Root: {}", truncate(&book.root.display().to_string(), 60));
    println!(
        "  Progress: {} at {} ({} chapters, {}x)",
        book.current_chapter()
            .map(|c| c.name.as_str())
            .unwrap_or("-"),
        book.position.as_hms(),
        book.chapters.len(),
        book.playback_speed
    );
}

fn parse_book_id(s: &str) -> Result<BookId> {
    BookId::from_string(s).with_context(|| format!("Invalid book ID: {}", s))
}

/// Accepts the short focus names as well as raw media focus strings
fn media_focus(focus: &str) -> String {
    match focus {
        "artist" => FOCUS_ARTIST.to_string(),
        "album" => FOCUS_ALBUM.to_string(),
        "playlist" => FOCUS_PLAYLIST.to_string(),
        "any" => FOCUS_ANY.to_string(),
        other => other.to_string(),
    }
}

fn default_name(root: &Path) -> String {
    root.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string()
}

/// One chapter per file, named after the file
///
/// Durations are unknown without decoding the audio and start at zero.
fn chapters_from_files(files: &[PathBuf]) -> Result<Vec<Chapter>> {
    files
        .iter()
        .map(|file| {
            if !file.exists() {
                bail!("File not found: {}", file.display());
            }

            let modified = std::fs::metadata(file)
                .and_then(|m| m.modified())
                .map(Timestamp::from_system_time)
                .unwrap_or(Timestamp::EPOCH);

            Ok(Chapter::new(
                file.clone(),
                default_name(file),
                Duration::ZERO,
                modified,
            ))
        })
        .collect()
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
