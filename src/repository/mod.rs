//! Repository layer for database operations

pub mod books;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{str::FromStr, time::Duration};

use crate::{config::DatabaseConfig, error::AppResult};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        title           TEXT    NOT NULL,
        author          TEXT    NOT NULL,
        published_date  TEXT    NOT NULL,
        number_of_pages INTEGER NOT NULL CHECK (number_of_pages > 0),
        created_at      INTEGER NOT NULL,
        updated_at      INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_books_title ON books (title)",
    "CREATE INDEX IF NOT EXISTS ix_books_author ON books (author)",
];

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create the `books` table and its indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Open the connection pool, creating the database file when missing
pub async fn connect(config: &DatabaseConfig) -> AppResult<Pool<Sqlite>> {
    // writers queue on the file lock instead of failing straight away
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn memory_repository() -> Repository {
    // a single connection that never expires keeps the in-memory database alive
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let repository = Repository::new(pool);
    repository.ensure_schema().await.unwrap();
    repository
}
