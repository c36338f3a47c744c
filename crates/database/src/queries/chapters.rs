//! Chapter database operations
//!
//! Chapters have no identity of their own: they are stored with their book
//! and replaced as a whole whenever the book is written.

use crate::queries::path_text;
use crate::DbPool;
use audioshelf_core::{AppError, BookId, Chapter, ChapterMarks, Duration, Timestamp};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use std::collections::HashMap;
use std::path::PathBuf;

/// Inserts the chapters of a book in playback order
pub async fn insert_chapters(
    conn: &mut SqliteConnection,
    book_id: BookId,
    chapters: &[Chapter],
) -> Result<(), AppError> {
    for (position, chapter) in chapters.iter().enumerate() {
        let marks_json = serde_json::to_string(&chapter.marks)
            .map_err(|e| AppError::database("Failed to serialize chapter marks", e))?;

        sqlx::query(
            r#"
            INSERT INTO chapters (book_id, position, file, name, duration, file_last_modified, marks)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(book_id.as_string())
        .bind(position as i64)
        .bind(path_text(&chapter.file, "chapter file")?)
        .bind(&chapter.name)
        .bind(chapter.duration.as_millis() as i64)
        .bind(chapter.file_last_modified.as_millis())
        .bind(marks_json)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to insert chapter", e))?;
    }

    Ok(())
}

/// Removes all chapters of a book
pub async fn delete_chapters(conn: &mut SqliteConnection, book_id: BookId) -> Result<(), AppError> {
    sqlx::query("DELETE FROM chapters WHERE book_id = ?")
        .bind(book_id.as_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to delete chapters", e))?;

    Ok(())
}

/// Gets all chapters for a book in playback order
pub async fn get_book_chapters(pool: &DbPool, book_id: BookId) -> Result<Vec<Chapter>, AppError> {
    let rows = sqlx::query(
        r#"
        SELECT file, name, duration, file_last_modified, marks
        FROM chapters WHERE book_id = ? ORDER BY position
        "#,
    )
    .bind(book_id.as_string())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get book chapters", e))?;

    rows.into_iter().map(row_to_chapter).collect()
}

/// Chapters of every book with the given active flag, grouped by book id
pub async fn chapters_by_book(
    pool: &DbPool,
    active: bool,
) -> Result<HashMap<String, Vec<Chapter>>, AppError> {
    use sqlx::Row;

    let rows = sqlx::query(
        r#"
        SELECT c.book_id, c.file, c.name, c.duration, c.file_last_modified, c.marks
        FROM chapters c
        JOIN books b ON b.id = c.book_id
        WHERE b.active = ?
        ORDER BY c.book_id, c.position
        "#,
    )
    .bind(active as i64)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list chapters", e))?;

    let mut grouped: HashMap<String, Vec<Chapter>> = HashMap::new();
    for row in rows {
        let book_id: String = row
            .try_get("book_id")
            .map_err(|e| AppError::database("Missing chapter book id", e))?;
        grouped.entry(book_id).or_default().push(row_to_chapter(row)?);
    }

    Ok(grouped)
}

pub(crate) fn row_to_chapter(row: SqliteRow) -> Result<Chapter, AppError> {
    use sqlx::Row;

    let file: String = row
        .try_get("file")
        .map_err(|e| AppError::database("Missing chapter file", e))?;
    let duration: i64 = row
        .try_get("duration")
        .map_err(|e| AppError::database("Missing chapter duration", e))?;
    let file_last_modified: i64 = row
        .try_get("file_last_modified")
        .map_err(|e| AppError::database("Missing chapter modification time", e))?;
    let marks_json: String = row
        .try_get("marks")
        .map_err(|e| AppError::database("Missing chapter marks", e))?;
    let marks: ChapterMarks = serde_json::from_str(&marks_json)
        .map_err(|e| AppError::database("Failed to deserialize chapter marks", e))?;

    Ok(Chapter {
        file: PathBuf::from(file),
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing chapter name", e))?,
        duration: Duration::from_signed_millis(duration),
        file_last_modified: Timestamp::from_millis(file_last_modified),
        marks,
    })
}
