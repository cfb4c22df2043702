//! Business logic services

pub mod auth;
pub mod catalog;

use std::{future::Future, time::Duration};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.server.operation_timeout_secs);

        Ok(Self {
            auth: auth::AuthService::new(repository.clone(), &config.auth, timeout)?,
            catalog: catalog::CatalogService::new(repository.clone(), timeout),
            repository,
        })
    }

    /// Check that the datastore answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

/// Run `operation`, failing with `AppError::Timeout` once `limit` elapses
pub(crate) async fn bounded<T, F>(limit: Duration, what: &str, operation: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| AppError::Timeout(format!("{} exceeded {:?}", what, limit)))?
}
