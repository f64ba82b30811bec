//! Book persistence

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{
    error::AppResult,
    models::book::{BookChanges, BookRecord, NewBook},
};

const COLUMNS: &str =
    "id, title, author, published_date, number_of_pages, created_at, updated_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get a book by id
    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<BookRecord>> {
        let row = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books WHERE id = ?",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Fetch one slice of books in id order
    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<BookRecord>> {
        let rows = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books ORDER BY id LIMIT ? OFFSET ?",
            COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a book; both timestamps get the same instant
    pub async fn create(&self, book: &NewBook) -> AppResult<BookRecord> {
        let now = Utc::now().timestamp_micros();
        let row = sqlx::query_as::<_, BookRecord>(&format!(
            r#"
            INSERT INTO books (title, author, published_date, number_of_pages, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.published_date)
        .bind(book.number_of_pages)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Apply `changes` to an existing book in a single statement.
    /// Returns `None` when the id is unknown.
    ///
    /// `updated_at` moves forward by at least one microsecond even if the
    /// clock has not ticked since the previous write.
    pub async fn update(&self, id: i64, changes: BookChanges) -> AppResult<Option<BookRecord>> {
        let row = sqlx::query_as::<_, BookRecord>(&format!(
            r#"
            UPDATE books
            SET title = COALESCE(?, title),
                author = COALESCE(?, author),
                published_date = COALESCE(?, published_date),
                number_of_pages = COALESCE(?, number_of_pages),
                updated_at = MAX(?, updated_at + 1)
            WHERE id = ?
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(changes.title)
        .bind(changes.author)
        .bind(changes.published_date)
        .bind(changes.number_of_pages)
        .bind(Utc::now().timestamp_micros())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Hard delete. Returns `false` when the id is unknown.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
