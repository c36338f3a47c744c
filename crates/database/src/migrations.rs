//! Database migrations
//!
//! Every migration runs inside its own transaction together with the
//! `schema_migrations` row that records it, so a failed migration leaves
//! the schema at the previous version.

use crate::DbPool;
use audioshelf_core::AppError;

/// A single schema step
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    sql: &'static str,
}

/// All migrations, in the order they are applied
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "books table",
        sql: include_str!("../migrations/001_books.sql"),
    },
    Migration {
        version: 2,
        description: "chapters table",
        sql: include_str!("../migrations/002_chapters.sql"),
    },
    Migration {
        version: 3,
        description: "clamp negative playback time",
        sql: include_str!("../migrations/003_clamp_negative_time.sql"),
    },
    Migration {
        version: 4,
        description: "indexes",
        sql: include_str!("../migrations/004_add_indexes.sql"),
    },
];

/// Current database schema version
pub const CURRENT_VERSION: i64 = 4;

/// Returns the current migration version
pub fn current_version() -> i64 {
    CURRENT_VERSION
}

/// Runs all pending migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    migrate_to(pool, CURRENT_VERSION).await
}

/// Runs pending migrations up to and including `target`
pub async fn migrate_to(pool: &DbPool, target: i64) -> Result<(), AppError> {
    ensure_migrations_table(pool).await?;

    let applied = applied_version(pool).await?;
    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > applied && m.version <= target)
    {
        apply(pool, migration).await?;
    }

    Ok(())
}

/// Highest applied migration version, 0 for a fresh database
pub async fn applied_version(pool: &DbPool) -> Result<i64, AppError> {
    ensure_migrations_table(pool).await?;

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to read schema version", e))?;

    Ok(version.unwrap_or(0))
}

async fn ensure_migrations_table(pool: &DbPool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create migrations table", e))?;

    Ok(())
}

async fn apply(pool: &DbPool, migration: &Migration) -> Result<(), AppError> {
    log::info!(
        "Applying migration {} ({})",
        migration.version,
        migration.description
    );

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::migration(migration.version, "could not start transaction", e))?;

    sqlx::raw_sql(migration.sql)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::migration(migration.version, migration.description, e))?;

    sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
        .bind(migration.version)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::migration(migration.version, "could not record version", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::migration(migration.version, "could not commit", e))?;

    Ok(())
}

/// Verifies database integrity
pub async fn verify_integrity(pool: &DbPool) -> Result<(), AppError> {
    let result: String = sqlx::query_scalar("PRAGMA integrity_check")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to check integrity", e))?;

    if result != "ok" {
        return Err(AppError::DatabaseCorrupted { details: result });
    }

    Ok(())
}

/// Optimizes the database
pub async fn optimize(pool: &DbPool) -> Result<(), AppError> {
    sqlx::query("PRAGMA optimize")
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to optimize database", e))?;

    Ok(())
}
