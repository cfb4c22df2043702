//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, BookRecord},
};

use super::{classify, BookStore};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self, limit: i64, offset: i64) -> AppResult<(Vec<Book>, i64)> {
        // Count and page in one statement; an empty page still yields a total-only row
        let rows = sqlx::query_as::<_, PageRow>(
            r#"
            WITH slice AS (
                SELECT id, title, author, category_id, isbn, total_copies, available_copies
                FROM books
                ORDER BY id
                LIMIT $1 OFFSET $2
            )
            SELECT (SELECT COUNT(*) FROM books) AS total,
                   slice.id, slice.title, slice.author, slice.category_id,
                   slice.isbn, slice.total_copies, slice.available_copies
            FROM (SELECT 1) AS anchor
            LEFT JOIN slice ON TRUE
            ORDER BY slice.id
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(split_page(rows))
    }

    async fn get(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, category_id, isbn, total_copies, available_copies
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Case-insensitive substring match on title, author and ISBN
    async fn search(&self, term: &str) -> AppResult<Vec<Book>> {
        let pattern = format!("%{}%", escape_like(term));

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, category_id, isbn, total_copies, available_copies
            FROM books
            WHERE title ILIKE $1 OR author ILIKE $1 OR isbn ILIKE $1
            ORDER BY title
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn create(&self, book: &BookRecord) -> AppResult<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, author, category_id, isbn, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.category_id)
        .bind(&book.isbn)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(id)
    }

    async fn update(&self, id: i32, book: &BookRecord) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3, category_id = $4, isbn = $5,
                total_copies = $6, available_copies = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.category_id)
        .bind(&book.isbn)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected())
    }
}

/// Escape LIKE wildcards so the term matches literally
/// Page row: the catalog total plus one book, or no book when the page is empty
#[derive(Debug, FromRow)]
struct PageRow {
    total: i64,
    id: Option<i32>,
    title: Option<String>,
    author: Option<String>,
    category_id: Option<i32>,
    isbn: Option<String>,
    total_copies: Option<i32>,
    available_copies: Option<i32>,
}

impl PageRow {
    fn into_book(self) -> Option<Book> {
        Some(Book {
            id: self.id?,
            title: self.title?,
            author: self.author?,
            category_id: self.category_id?,
            isbn: self.isbn?,
            total_copies: self.total_copies?,
            available_copies: self.available_copies?,
        })
    }
}

fn split_page(rows: Vec<PageRow>) -> (Vec<Book>, i64) {
    let total = rows.first().map_or(0, |row| row.total);
    let books = rows.into_iter().filter_map(PageRow::into_book).collect();
    (books, total)
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
