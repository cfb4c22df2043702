//! Catalog management service

use std::{sync::Arc, time::Duration};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookListQuery, BookPage, BookRequest, BookSearchQuery},
        Book,
    },
    repository::{BookStore, Repository},
};

use super::bounded;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookStore>,
    timeout: Duration,
}

impl CatalogService {
    pub fn new(repository: Repository, timeout: Duration) -> Self {
        Self {
            books: repository.books,
            timeout,
        }
    }

    pub async fn list_books(&self, query: &BookListQuery) -> AppResult<BookPage> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::Validation(format!("page {} is out of range", page)))?;

        let (items, total) =
            bounded(self.timeout, "book list", self.books.list(per_page, offset)).await?;

        Ok(BookPage {
            items,
            total,
            page,
            per_page,
        })
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        bounded(self.timeout, "book lookup", self.books.get(id))
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn search_books(&self, query: &BookSearchQuery) -> AppResult<Vec<Book>> {
        let term = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::Validation("Missing required field: q".to_string()))?;

        bounded(self.timeout, "book search", self.books.search(term)).await
    }

    pub async fn create_book(&self, request: BookRequest) -> AppResult<i32> {
        let record = request.into_record()?;
        bounded(self.timeout, "book insert", self.books.create(&record)).await
    }

    pub async fn update_book(&self, id: i32, request: BookRequest) -> AppResult<()> {
        let record = request.into_record()?;
        let affected = bounded(self.timeout, "book update", self.books.update(id, &record)).await?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let affected = bounded(self.timeout, "book delete", self.books.delete(id)).await?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}
