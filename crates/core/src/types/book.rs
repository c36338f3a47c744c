//! Book and chapter domain models

use crate::error::AppError;
use crate::types::{Duration, Timestamp, Validator};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::{Chars, FromStr};
use uuid::Uuid;

/// Unique identifier for a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    /// Creates a new random BookId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a BookId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the BookId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a book was assembled from the file system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookType {
    /// A folder inside a collection folder, one book per sub folder
    CollectionFolder,
    /// A single file inside a collection folder
    CollectionFile,
    /// A folder added directly as one book
    SingleFolder,
    /// A file added directly as one book
    SingleFile,
}

impl BookType {
    /// Stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CollectionFolder => "COLLECTION_FOLDER",
            Self::CollectionFile => "COLLECTION_FILE",
            Self::SingleFolder => "SINGLE_FOLDER",
            Self::SingleFile => "SINGLE_FILE",
        }
    }

    /// Returns true for the two collection variants
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::CollectionFolder | Self::CollectionFile)
    }
}

impl std::fmt::Display for BookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COLLECTION_FOLDER" => Ok(Self::CollectionFolder),
            "COLLECTION_FILE" => Ok(Self::CollectionFile),
            "SINGLE_FOLDER" => Ok(Self::SingleFolder),
            "SINGLE_FILE" => Ok(Self::SingleFile),
            other => Err(AppError::InvalidMetadata {
                field: "book type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Named positions inside a chapter's file, keyed by offset in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterMarks(BTreeMap<u64, String>);

impl ChapterMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mark, keeping an existing mark at the same position
    pub fn insert(&mut self, position: Duration, name: impl Into<String>) {
        self.0.entry(position.as_millis()).or_insert_with(|| name.into());
    }

    /// Name of the mark starting exactly at `position`
    pub fn get(&self, position: Duration) -> Option<&str> {
        self.0.get(&position.as_millis()).map(String::as_str)
    }

    /// The mark that is playing at `position`: the last one starting at or
    /// before it
    pub fn mark_at(&self, position: Duration) -> Option<(Duration, &str)> {
        self.0
            .range(..=position.as_millis())
            .next_back()
            .map(|(start, name)| (Duration::from_millis(*start), name.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Duration, &str)> {
        self.0
            .iter()
            .map(|(start, name)| (Duration::from_millis(*start), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Duration, String)> for ChapterMarks {
    fn from_iter<I: IntoIterator<Item = (Duration, String)>>(iter: I) -> Self {
        let mut marks = Self::new();
        for (position, name) in iter {
            marks.insert(position, name);
        }
        marks
    }
}

/// One playable file of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub file: PathBuf,
    pub name: String,
    pub duration: Duration,
    /// Modification time of `file` when it was scanned
    pub file_last_modified: Timestamp,
    pub marks: ChapterMarks,
}

impl Chapter {
    /// Creates a chapter without marks
    pub fn new(
        file: PathBuf,
        name: String,
        duration: Duration,
        file_last_modified: Timestamp,
    ) -> Self {
        Self {
            file,
            name,
            duration,
            file_last_modified,
            marks: ChapterMarks::new(),
        }
    }

    /// Replaces the marks of this chapter
    pub fn with_marks(mut self, marks: ChapterMarks) -> Self {
        self.marks = marks;
        self
    }
}

impl Validator for Chapter {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Chapter name cannot be empty".to_string());
        }

        if self.file.as_os_str().is_empty() {
            errors.push("Chapter file cannot be empty".to_string());
        }

        if let Some((last, _)) = self.marks.iter().last() {
            if !self.duration.is_zero() && last > self.duration {
                errors.push("Chapter marks must lie inside the chapter".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// An audiobook: an ordered list of chapters plus playback progress
///
/// Books are treated as values. Progress is recorded by building a new book
/// (see [`Book::with_position`]) and handing it to the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub book_type: BookType,
    pub author: Option<String>,
    /// File of the chapter being played
    pub current_file: PathBuf,
    /// Elapsed time inside `current_file`
    pub position: Duration,
    pub name: String,
    pub chapters: Vec<Chapter>,
    pub playback_speed: f32,
    pub root: PathBuf,
}

impl Book {
    /// Creates a new book positioned at the start of its first chapter
    pub fn new(name: String, book_type: BookType, root: PathBuf, chapters: Vec<Chapter>) -> Self {
        let current_file = chapters
            .first()
            .map(|c| c.file.clone())
            .unwrap_or_else(|| root.clone());

        Self {
            id: BookId::new(),
            book_type,
            author: None,
            current_file,
            position: Duration::ZERO,
            name,
            chapters,
            playback_speed: 1.0,
            root,
        }
    }

    /// Returns a copy with the given author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Returns a copy positioned at `position` inside `file`
    pub fn with_position(mut self, file: PathBuf, position: Duration) -> Self {
        self.current_file = file;
        self.position = position;
        self
    }

    /// The chapter whose file is being played
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.chapter_by_file(&self.current_file)
    }

    /// First chapter backed by `file`
    pub fn chapter_by_file(&self, file: &Path) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.file == file)
    }

    /// Sum of all chapter durations
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.chapters.iter().map(|c| c.duration.as_millis()).sum())
    }

    /// Ordering used for the active book list: natural, case-insensitive
    /// name order, then id so that distinct books never compare equal
    pub fn compare_by_name(&self, other: &Book) -> Ordering {
        natural_cmp(&self.name, &other.name).then_with(|| self.id.cmp(&other.id))
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name cannot be empty".to_string());
        }

        if self.chapters.is_empty() {
            errors.push("A book needs at least one chapter".to_string());
        } else if self.current_chapter().is_none() {
            errors.push("Current file must belong to one of the chapters".to_string());
        }

        if self.playback_speed.is_nan() || self.playback_speed <= 0.0 {
            errors.push("Playback speed must be greater than zero".to_string());
        }

        for chapter in &self.chapters {
            if let Err(mut chapter_errors) = chapter.validate() {
                errors.append(&mut chapter_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Compares two names so that embedded numbers sort by value
/// ("Part 2" before "Part 10") and letters ignore case
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ord = take_number(&mut left).cmp(&take_number(&mut right));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                left.next();
                right.next();
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Consumes a run of digits; the result orders by numeric value
fn take_number(chars: &mut Peekable<Chars<'_>>) -> (usize, String) {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(c);
    }
    let significant = digits.trim_start_matches('0').to_string();
    (significant.len(), significant)
}
