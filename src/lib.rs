//! Library catalog server
//!
//! REST JSON API for a library's book catalog, with account registration,
//! password login, signed session tokens and role-based access control.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> AppResult<Self> {
        let services = services::Services::new(repository, &config)?;
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }
}
