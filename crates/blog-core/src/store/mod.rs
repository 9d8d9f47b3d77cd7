//! Persistence layer
//!
//! Repository traits for users and posts, with a PostgreSQL implementation
//! for deployments and an in-memory implementation for tests and local runs.
//! Email uniqueness is enforced by the store; a duplicate insert surfaces as
//! `RepositoryError::Conflict`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{NewPost, NewUser, Post, PostChanges, PostWithAuthor, Role, User};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    /// Insert a user; fails with `Conflict` if the email is taken
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Option<User>, RepositoryError>;

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, RepositoryError>;

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, RepositoryError>;

    /// Returns `false` if no such user existed
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}

/// Post persistence
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepositoryError>;

    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepositoryError>;

    /// Published posts, newest first
    async fn list_published(&self) -> Result<Vec<PostWithAuthor>, RepositoryError>;

    /// All posts of one author, published or not, newest first
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepositoryError>;

    async fn update(&self, id: Uuid, changes: PostChanges)
        -> Result<Option<Post>, RepositoryError>;

    /// Returns `false` if no such post existed
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}
