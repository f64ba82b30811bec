//! Book Management API
//!
//! A REST JSON service storing book records in SQLite, with paginated
//! listing and HTTP Basic authentication on mutating operations.

use std::sync::Arc;

pub mod api;
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
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire services to an opened repository
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        Self {
            services: Arc::new(services::Services::new(repository, config.auth)),
        }
    }
}
