//! Repository layer for database operations

pub mod accounts;
pub mod books;
pub mod memory;

use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    Pool, Postgres,
};

use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::{Account, Book, BookRecord, NewAccount},
};

/// Credential storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_identity(&self, identity: &str) -> AppResult<Option<Account>>;

    /// Insert an account, returning its id. A taken identity is a `Conflict`.
    async fn create(&self, account: &NewAccount) -> AppResult<i32>;
}

/// Book storage. Writes report the number of affected rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list(&self, limit: i64, offset: i64) -> AppResult<(Vec<Book>, i64)>;

    async fn get(&self, id: i32) -> AppResult<Option<Book>>;

    async fn search(&self, term: &str) -> AppResult<Vec<Book>>;

    async fn create(&self, book: &BookRecord) -> AppResult<i32>;

    async fn update(&self, id: i32, book: &BookRecord) -> AppResult<u64>;

    async fn delete(&self, id: i32) -> AppResult<u64>;
}

/// Datastore handles shared by the services
#[derive(Clone)]
pub struct Repository {
    pub accounts: Arc<dyn AccountStore>,
    pub books: Arc<dyn BookStore>,
    pool: Option<Pool<Postgres>>,
}

impl Repository {
    pub fn new(accounts: Arc<dyn AccountStore>, books: Arc<dyn BookStore>) -> Self {
        Self {
            accounts,
            books,
            pool: None,
        }
    }

    /// Repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            accounts: Arc::new(accounts::AccountsRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repository backed by a fresh in-process store
    pub fn in_memory() -> (Self, memory::MemoryStore) {
        let store = memory::MemoryStore::new();
        let repository = Self::new(Arc::new(store.clone()), Arc::new(store.clone()));
        (repository, store)
    }

    /// Round trip to the database, if there is one
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Open the connection pool, pinning the server certificate when configured
pub async fn connect(config: &DatabaseConfig) -> Result<Pool<Postgres>, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(&config.url)?;
    if let Some(ref ca_cert_path) = config.ca_cert_path {
        options = options
            .ssl_mode(PgSslMode::VerifyFull)
            .ssl_root_cert(ca_cert_path);
    }

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(options)
        .await
}

/// Map constraint violations to `Conflict`; everything else stays a database error
pub(crate) fn classify(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = error {
        if db.is_unique_violation() {
            return AppError::Conflict("A record with the same unique value already exists".to_string());
        }
        if db.is_foreign_key_violation() {
            return AppError::Conflict("A referenced record does not exist".to_string());
        }
    }
    AppError::Database(error)
}
