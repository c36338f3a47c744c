//! Integration tests for schema migrations on a file-backed database

use audioshelf_core::{AppError, Duration};
use audioshelf_database::{
    connect,
    migrations::{applied_version, migrate_to, run_migrations, CURRENT_VERSION},
    queries::books,
    DbPool,
};
use tempfile::NamedTempFile;

type Result<T> = std::result::Result<T, AppError>;

async fn setup_file_db() -> Result<(DbPool, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let pool = connect(temp_file.path()).await?;
    Ok((pool, temp_file))
}

async fn insert_raw_book(pool: &DbPool, id: &str, time: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO books (id, name, author, current_media_path, playback_speed, root, time, type, active)
        VALUES (?, 'Legacy', NULL, '/legacy/01.mp3', 1.0, '/legacy', ?, 'SINGLE_FOLDER', 1)
        "#,
    )
    .bind(id)
    .bind(time)
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to insert legacy row", e))?;
    Ok(())
}

#[tokio::test]
async fn test_negative_times_are_clamped_to_zero() -> Result<()> {
    let (pool, _temp) = setup_file_db().await?;

    // Schema as it was before the clamp step
    migrate_to(&pool, 2).await?;
    insert_raw_book(&pool, "00000000-0000-4000-8000-000000000001", -100).await?;
    insert_raw_book(&pool, "00000000-0000-4000-8000-000000000002", 5000).await?;

    run_migrations(&pool).await?;

    let mut times: Vec<i64> = sqlx::query_scalar("SELECT time FROM books")
        .fetch_all(&pool)
        .await
        .map_err(|e| AppError::database("Failed to read times", e))?;
    times.sort_unstable();

    assert_eq!(times, vec![0, 5000]);
    assert_eq!(applied_version(&pool).await?, CURRENT_VERSION);
    Ok(())
}

#[tokio::test]
async fn test_migrated_rows_load_as_books() -> Result<()> {
    let (pool, _temp) = setup_file_db().await?;

    migrate_to(&pool, 2).await?;
    insert_raw_book(&pool, "00000000-0000-4000-8000-000000000003", -1).await?;
    run_migrations(&pool).await?;

    let active = books::list_books(&pool, true).await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].position, Duration::ZERO);
    assert_eq!(active[0].author, None);
    assert!(active[0].chapters.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reopened_database_keeps_version() -> Result<()> {
    let temp_file = NamedTempFile::new()?;
    let pool = connect(temp_file.path()).await?;
    run_migrations(&pool).await?;
    pool.close().await;

    let pool = connect(temp_file.path()).await?;
    assert_eq!(applied_version(&pool).await?, CURRENT_VERSION);
    run_migrations(&pool).await?;
    assert_eq!(applied_version(&pool).await?, CURRENT_VERSION);
    Ok(())
}
