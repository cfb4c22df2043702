//! In-process datastore.
//!
//! Enforces the same constraints as the SQL schema (unique identity, unique
//! ISBN, existing category) so services behave identically on top of it.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{Account, Book, BookRecord, NewAccount},
};

use super::{AccountStore, BookStore};

#[derive(Default)]
struct State {
    accounts: BTreeMap<i32, Account>,
    books: BTreeMap<i32, Book>,
    categories: BTreeMap<i32, String>,
    next_account_id: i32,
    next_book_id: i32,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_category(&self, id: i32, name: &str) {
        self.state.write().await.categories.insert(id, name.to_string());
    }

    pub async fn account_count(&self) -> usize {
        self.state.read().await.accounts.len()
    }

    pub async fn book_count(&self) -> usize {
        self.state.read().await.books.len()
    }

    pub async fn account(&self, identity: &str) -> Option<Account> {
        self.state
            .read()
            .await
            .accounts
            .values()
            .find(|a| a.identity == identity)
            .cloned()
    }
}

impl State {
    fn check_book_constraints(&self, book: &BookRecord, exclude_id: Option<i32>) -> AppResult<()> {
        if !self.categories.contains_key(&book.category_id) {
            return Err(AppError::Conflict("A referenced record does not exist".to_string()));
        }
        let isbn_taken = self
            .books
            .values()
            .any(|b| b.isbn == book.isbn && Some(b.id) != exclude_id);
        if isbn_taken {
            return Err(AppError::Conflict(
                "A record with the same unique value already exists".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_identity(&self, identity: &str) -> AppResult<Option<Account>> {
        Ok(self.account(identity).await)
    }

    async fn create(&self, account: &NewAccount) -> AppResult<i32> {
        let mut state = self.state.write().await;

        if state.accounts.values().any(|a| a.identity == account.identity) {
            return Err(AppError::Conflict(
                "A record with the same unique value already exists".to_string(),
            ));
        }

        state.next_account_id += 1;
        let id = state.next_account_id;
        state.accounts.insert(
            id,
            Account {
                id,
                identity: account.identity.clone(),
                display_name: account.display_name.clone(),
                password_hash: account.password_hash.clone(),
                role: account.role,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self, limit: i64, offset: i64) -> AppResult<(Vec<Book>, i64)> {
        let state = self.state.read().await;
        let books = state
            .books
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((books, state.books.len() as i64))
    }

    async fn get(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn search(&self, term: &str) -> AppResult<Vec<Book>> {
        let term = term.to_lowercase();
        let mut books: Vec<Book> = self
            .state
            .read()
            .await
            .books
            .values()
            .filter(|b| {
                b.title.to_lowercase().contains(&term)
                    || b.author.to_lowercase().contains(&term)
                    || b.isbn.to_lowercase().contains(&term)
            })
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn create(&self, book: &BookRecord) -> AppResult<i32> {
        let mut state = self.state.write().await;
        state.check_book_constraints(book, None)?;

        state.next_book_id += 1;
        let id = state.next_book_id;
        state.books.insert(id, to_book(id, book));
        Ok(id)
    }

    async fn update(&self, id: i32, book: &BookRecord) -> AppResult<u64> {
        let mut state = self.state.write().await;
        if !state.books.contains_key(&id) {
            return Ok(0);
        }
        state.check_book_constraints(book, Some(id))?;
        state.books.insert(id, to_book(id, book));
        Ok(1)
    }

    async fn delete(&self, id: i32) -> AppResult<u64> {
        Ok(self.state.write().await.books.remove(&id).map_or(0, |_| 1))
    }
}

fn to_book(id: i32, book: &BookRecord) -> Book {
    Book {
        id,
        title: book.title.clone(),
        author: book.author.clone(),
        category_id: book.category_id,
        isbn: book.isbn.clone(),
        total_copies: book.total_copies,
        available_copies: book.available_copies,
    }
}
