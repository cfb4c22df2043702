//! Accounts repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Account, NewAccount},
};

use super::{classify, AccountStore};

#[derive(Clone)]
pub struct AccountsRepository {
    pool: Pool<Postgres>,
}

impl AccountsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for AccountsRepository {
    /// Get account by identity (exact match)
    async fn find_by_identity(&self, identity: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, identity, display_name, password_hash, role, created_at
            FROM accounts
            WHERE identity = $1
            "#,
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create(&self, account: &NewAccount) -> AppResult<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (identity, display_name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&account.identity)
        .bind(&account.display_name)
        .bind(&account.password_hash)
        .bind(account.role)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(id)
    }
}
