//! Book database operations
//!
//! A book row and its chapters are always written in one transaction.

use crate::queries::chapters::{chapters_by_book, delete_chapters, get_book_chapters, insert_chapters};
use crate::queries::path_text;
use crate::DbPool;
use audioshelf_core::{AppError, Book, BookId, BookType, Chapter, Duration};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use std::path::PathBuf;

const BOOK_COLUMNS: &str =
    "id, name, author, current_media_path, playback_speed, root, time, type, active";

/// Inserts a new active book together with its chapters
pub async fn create_book(pool: &DbPool, book: &Book) -> Result<(), AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin transaction", e))?;

    sqlx::query(
        r#"
        INSERT INTO books (id, name, author, current_media_path, playback_speed, root, time, type, active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind(book.id.as_string())
    .bind(&book.name)
    .bind(&book.author)
    .bind(path_text(&book.current_file, "current_file")?)
    .bind(book.playback_speed as f64)
    .bind(path_text(&book.root, "root")?)
    .bind(book.position.as_millis() as i64)
    .bind(book.book_type.as_str())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::database("Failed to create book", e))?;

    insert_chapters(&mut *tx, book.id, &book.chapters).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit book", e))?;

    Ok(())
}

/// Overwrites a stored book and its chapters, keeping its active flag
pub async fn update_book(pool: &DbPool, book: &Book) -> Result<(), AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin transaction", e))?;

    let result = sqlx::query(
        r#"
        UPDATE books SET
            name = ?, author = ?, current_media_path = ?, playback_speed = ?,
            root = ?, time = ?, type = ?
        WHERE id = ?
        "#,
    )
    .bind(&book.name)
    .bind(&book.author)
    .bind(path_text(&book.current_file, "current_file")?)
    .bind(book.playback_speed as f64)
    .bind(path_text(&book.root, "root")?)
    .bind(book.position.as_millis() as i64)
    .bind(book.book_type.as_str())
    .bind(book.id.as_string())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::database("Failed to update book", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found(book.id));
    }

    delete_chapters(&mut *tx, book.id).await?;
    insert_chapters(&mut *tx, book.id, &book.chapters).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit book update", e))?;

    Ok(())
}

/// Stores `book` as active, inserting it if it was never stored
pub async fn reveal_book(pool: &DbPool, book: &Book) -> Result<(), AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin transaction", e))?;

    sqlx::query(
        r#"
        INSERT INTO books (id, name, author, current_media_path, playback_speed, root, time, type, active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            author = excluded.author,
            current_media_path = excluded.current_media_path,
            playback_speed = excluded.playback_speed,
            root = excluded.root,
            time = excluded.time,
            type = excluded.type,
            active = 1
        "#,
    )
    .bind(book.id.as_string())
    .bind(&book.name)
    .bind(&book.author)
    .bind(path_text(&book.current_file, "current_file")?)
    .bind(book.playback_speed as f64)
    .bind(path_text(&book.root, "root")?)
    .bind(book.position.as_millis() as i64)
    .bind(book.book_type.as_str())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::database("Failed to reveal book", e))?;

    delete_chapters(&mut *tx, book.id).await?;
    insert_chapters(&mut *tx, book.id, &book.chapters).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit revealed book", e))?;

    Ok(())
}

/// Sets the active flag of a stored book
pub async fn set_active(
    conn: &mut SqliteConnection,
    id: BookId,
    active: bool,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE books SET active = ? WHERE id = ?")
        .bind(active as i64)
        .bind(id.as_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to change book visibility", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }

    Ok(())
}

/// Marks a book as orphaned
pub async fn hide_book(pool: &DbPool, id: BookId) -> Result<(), AppError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| AppError::database("Failed to acquire connection", e))?;

    set_active(&mut *conn, id, false).await
}

/// Marks several books as orphaned; either all of them change or none
pub async fn hide_books(pool: &DbPool, ids: &[BookId]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin transaction", e))?;

    for id in ids {
        set_active(&mut *tx, *id, false).await?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit hidden books", e))?;

    Ok(())
}

/// Gets a book by ID together with its active flag
pub async fn get_book(pool: &DbPool, id: BookId) -> Result<Option<(Book, bool)>, AppError> {
    use sqlx::Row;

    let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
        .bind(id.as_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch book", e))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let active: i64 = row
        .try_get("active")
        .map_err(|e| AppError::database("Missing active flag", e))?;
    let chapters = get_book_chapters(pool, id).await?;

    Ok(Some((row_to_book(row, chapters)?, active != 0)))
}

/// Lists active (`true`) or orphaned (`false`) books with their chapters
pub async fn list_books(pool: &DbPool, active: bool) -> Result<Vec<Book>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE active = ? ORDER BY name"
    ))
    .bind(active as i64)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list books", e))?;

    let mut chapters = chapters_by_book(pool, active).await?;

    rows.into_iter()
        .map(|row| {
            use sqlx::Row;
            let id: String = row
                .try_get("id")
                .map_err(|e| AppError::database("Missing book ID", e))?;
            let book_chapters = chapters.remove(&id).unwrap_or_default();
            row_to_book(row, book_chapters)
        })
        .collect()
}

/// Converts a database row and its chapters to a Book
pub(crate) fn row_to_book(row: SqliteRow, chapters: Vec<Chapter>) -> Result<Book, AppError> {
    use sqlx::Row;

    let id_str: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing book ID", e))?;
    let id = BookId::from_string(&id_str).map_err(|e| AppError::database("Invalid book ID", e))?;

    let type_str: String = row
        .try_get("type")
        .map_err(|e| AppError::database("Missing book type", e))?;
    let book_type: BookType = type_str.parse()?;

    let current_media_path: String = row
        .try_get("current_media_path")
        .map_err(|e| AppError::database("Missing current media path", e))?;
    let root: String = row
        .try_get("root")
        .map_err(|e| AppError::database("Missing root", e))?;
    let time: i64 = row
        .try_get("time")
        .map_err(|e| AppError::database("Missing playback time", e))?;
    let playback_speed: f64 = row
        .try_get("playback_speed")
        .map_err(|e| AppError::database("Missing playback speed", e))?;

    Ok(Book {
        id,
        book_type,
        author: row
            .try_get("author")
            .map_err(|e| AppError::database("Missing author", e))?,
        current_file: PathBuf::from(current_media_path),
        position: Duration::from_signed_millis(time),
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing name", e))?,
        chapters,
        playback_speed: playback_speed as f32,
        root: PathBuf::from(root),
    })
}

fn not_found(id: BookId) -> AppError {
    AppError::RecordNotFound {
        entity: "Book".to_string(),
        identifier: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_test_db;
    use crate::migrations::run_migrations;
    use audioshelf_core::{ChapterMarks, Timestamp};

    async fn setup() -> Result<DbPool, AppError> {
        let pool = create_test_db().await?;
        run_migrations(&pool).await?;
        Ok(pool)
    }

    fn create_test_book(name: &str) -> Book {
        let root = PathBuf::from(format!("/sdcard/Audiobooks/{name}"));
        let mut marks = ChapterMarks::new();
        marks.insert(Duration::ZERO, "Prologue");
        marks.insert(Duration::from_seconds(90), "The Storm");

        let chapters = vec![
            Chapter::new(
                root.join("01.mka"),
                "Part One".to_string(),
                Duration::from_seconds(1800),
                Timestamp::from_millis(1_600_000_000_000),
            )
            .with_marks(marks),
            Chapter::new(
                root.join("02.mp3"),
                "Part Two".to_string(),
                Duration::from_seconds(1200),
                Timestamp::from_millis(1_600_000_100_000),
            ),
        ];

        Book::new(name.to_string(), BookType::SingleFolder, root, chapters).with_author("Frank Herbert")
    }

    #[tokio::test]
    async fn test_create_and_get_book() {
        let pool = setup().await.expect("Failed to setup database");
        let book = create_test_book("Dune");

        create_book(&pool, &book)
            .await
            .expect("Failed to create book");

        let (retrieved, active) = get_book(&pool, book.id)
            .await
            .expect("Failed to get book")
            .expect("Book should exist");
        assert_eq!(retrieved, book);
        assert!(active);
    }

    #[tokio::test]
    async fn test_get_missing_book_is_none() {
        let pool = setup().await.expect("Failed to setup database");

        let result = get_book(&pool, BookId::new()).await.expect("Query failed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_book_replaces_chapters() {
        let pool = setup().await.expect("Failed to setup database");
        let book = create_test_book("Dune");
        create_book(&pool, &book)
            .await
            .expect("Failed to create book");

        let mut updated = book
            .clone()
            .with_position(book.chapters[1].file.clone(), Duration::from_seconds(42));
        updated.chapters[0].name = "Renamed".to_string();
        updated.chapters.push(Chapter::new(
            book.root.join("03.mp3"),
            "Part Three".to_string(),
            Duration::from_seconds(600),
            Timestamp::from_millis(1_600_000_200_000),
        ));
        updated.playback_speed = 1.5;

        update_book(&pool, &updated)
            .await
            .expect("Failed to update book");

        let (retrieved, _) = get_book(&pool, book.id)
            .await
            .expect("Failed to get updated book")
            .expect("Book should exist");
        assert_eq!(retrieved, updated);
    }

    #[tokio::test]
    async fn test_update_missing_book_fails() {
        let pool = setup().await.expect("Failed to setup database");
        let book = create_test_book("Ghost");

        let result = update_book(&pool, &book).await;
        assert!(matches!(result, Err(AppError::RecordNotFound { .. })));
    }

    #[tokio::test]
    async fn test_hide_and_reveal() {
        let pool = setup().await.expect("Failed to setup database");
        let book = create_test_book("Dune");
        create_book(&pool, &book)
            .await
            .expect("Failed to create book");

        hide_book(&pool, book.id).await.expect("Failed to hide book");
        assert!(list_books(&pool, true).await.unwrap().is_empty());
        assert_eq!(list_books(&pool, false).await.unwrap(), vec![book.clone()]);

        reveal_book(&pool, &book)
            .await
            .expect("Failed to reveal book");
        assert_eq!(list_books(&pool, true).await.unwrap(), vec![book]);
        assert!(list_books(&pool, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reveal_unknown_book_inserts_it() {
        let pool = setup().await.expect("Failed to setup database");
        let book = create_test_book("Fresh");

        reveal_book(&pool, &book)
            .await
            .expect("Failed to reveal book");

        let (retrieved, active) = get_book(&pool, book.id).await.unwrap().unwrap();
        assert_eq!(retrieved, book);
        assert!(active);
    }

    #[tokio::test]
    async fn test_hide_books_is_all_or_nothing() {
        let pool = setup().await.expect("Failed to setup database");
        let first = create_test_book("First");
        let second = create_test_book("Second");
        create_book(&pool, &first).await.unwrap();
        create_book(&pool, &second).await.unwrap();

        let result = hide_books(&pool, &[first.id, BookId::new()]).await;
        assert!(result.is_err());
        assert_eq!(list_books(&pool, true).await.unwrap().len(), 2);

        hide_books(&pool, &[first.id, second.id])
            .await
            .expect("Failed to hide books");
        assert!(list_books(&pool, true).await.unwrap().is_empty());
        assert_eq!(list_books(&pool, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_hide_missing_book_fails() {
        let pool = setup().await.expect("Failed to setup database");

        let result = hide_book(&pool, BookId::new()).await;
        assert!(matches!(result, Err(AppError::RecordNotFound { .. })));
    }

    #[tokio::test]
    async fn test_negative_stored_time_reads_as_zero() {
        let pool = setup().await.expect("Failed to setup database");
        let book = create_test_book("Dune");
        create_book(&pool, &book).await.unwrap();

        sqlx::query("UPDATE books SET time = -250 WHERE id = ?")
            .bind(book.id.as_string())
            .execute(&pool)
            .await
            .unwrap();

        let (retrieved, _) = get_book(&pool, book.id).await.unwrap().unwrap();
        assert_eq!(retrieved.position, Duration::ZERO);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let pool = setup().await.expect("Failed to setup database");
        let mut book = create_test_book("Dune");
        book.root = PathBuf::from(OsStr::from_bytes(b"/sdcard/Audiobooks/D\xfcne"));

        let result = create_book(&pool, &book).await;
        assert!(matches!(
            result,
            Err(AppError::InvalidArgument { ref argument, .. }) if argument == "root"
        ));
        assert!(get_book(&pool, book.id).await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_chapter_file_leaves_no_row() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let pool = setup().await.expect("Failed to setup database");
        let mut book = create_test_book("Dune");
        book.chapters[1].file = PathBuf::from(OsStr::from_bytes(b"/sdcard/Audiobooks/Dune/\xff.mp3"));

        let result = create_book(&pool, &book).await;
        assert!(matches!(
            result,
            Err(AppError::InvalidArgument { ref argument, .. }) if argument == "chapter file"
        ));
        assert!(get_book(&pool, book.id).await.unwrap().is_none());
    }
}
