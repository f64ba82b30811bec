//! Book CRUD service

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, UpdateBook},
        pagination::{BookPage, PageRequest},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a book by id
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        let record = self
            .repository
            .books
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::book_not_found(id))?;
        Book::try_from(record)
    }

    /// List one page of books with the total count.
    ///
    /// The slice and the count are two independent reads; a concurrent write
    /// between them can make them disagree.
    pub async fn list_books(&self, request: PageRequest) -> AppResult<BookPage> {
        let records = self
            .repository
            .books
            .list(request.offset(), request.limit())
            .await?;
        let total = self.repository.books.count().await?;
        tracing::debug!(
            "Listed {} books (page {}, page_size {}, total {})",
            records.len(),
            request.page(),
            request.page_size(),
            total
        );

        let books = records
            .into_iter()
            .map(Book::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(BookPage::new(books, total, request))
    }

    /// Validate and insert a new book
    pub async fn create_book(&self, payload: CreateBook) -> AppResult<Book> {
        let new_book = payload.into_new_book()?;
        let created = self.repository.books.create(&new_book).await?;
        tracing::info!("Created book id={} title={:?}", created.id, created.title);
        Book::try_from(created)
    }

    /// Apply a partial update to an existing book
    pub async fn update_book(&self, id: i64, payload: UpdateBook) -> AppResult<Book> {
        let changes = payload.into_changes()?;
        let updated = self
            .repository
            .books
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::book_not_found(id))?;
        tracing::info!("Updated book id={}", updated.id);
        Book::try_from(updated)
    }

    /// Permanently remove a book
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        if !self.repository.books.delete(id).await? {
            return Err(AppError::book_not_found(id));
        }
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }
}
