//! Audioshelf Database Layer
//!
//! This crate persists the audiobook library in SQLite using sqlx. Books and
//! their chapters are written through [`BookStorage`]; the schema is managed
//! by the numbered steps in [`migrations`].

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod storage;

pub use connection::{connect, DbPool};
pub use migrations::{current_version, optimize, run_migrations, verify_integrity};
pub use storage::{BookStorage, SqliteBookStorage};
