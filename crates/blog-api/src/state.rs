//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::jwt::TokenService;
use crate::auth::password::{PasswordError, PasswordService};
use blog_core::{AppConfig, Environment, PgStore, PostRepository, UserRepository};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Signs and verifies identity tokens
    pub tokens: TokenService,
    /// Argon2id hashing on the blocking pool
    pub passwords: PasswordService,
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    /// Set when backed by PostgreSQL, used by the health check
    pub database: Option<PgStore>,
}

impl AppState {
    /// Build state over PostgreSQL
    pub fn new(config: AppConfig, store: PgStore) -> Result<Self, PasswordError> {
        let users: Arc<dyn UserRepository> = Arc::new(store.clone());
        let posts: Arc<dyn PostRepository> = Arc::new(store.clone());
        let mut state = Self::with_repositories(config, users, posts)?;
        state.database = Some(store);
        Ok(state)
    }

    /// Build state over arbitrary repositories
    pub fn with_repositories(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Result<Self, PasswordError> {
        Ok(Self {
            tokens: TokenService::new(&config.auth),
            passwords: PasswordService::new(&config.auth.password_hash)?,
            config,
            start_time: Instant::now(),
            users,
            posts,
            database: None,
        })
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
