//! In-memory store
//!
//! Backs the repositories with `RwLock`ed maps. Enforces the same email
//! uniqueness and cascade-on-delete rules as the PostgreSQL schema.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PostRepository, RepositoryError, UserRepository};
use crate::{AuthorSummary, NewPost, NewUser, Post, PostChanges, PostWithAuthor, Role, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
}

impl Tables {
    fn with_author(&self, post: &Post) -> Option<PostWithAuthor> {
        self.users.get(&post.author_id).map(|author| PostWithAuthor {
            post: post.clone(),
            author: AuthorSummary {
                id: author.id,
                name: author.name.clone(),
            },
        })
    }
}

/// Map-backed store; clones share the same tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify_user<F>(&self, id: Uuid, apply: F) -> Result<Option<User>, RepositoryError>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            apply(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "duplicate key value violates unique constraint \"users_email_key\" ({})",
                user.email
            )));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Option<User>, RepositoryError> {
        let name = name.to_string();
        self.modify_user(id, move |user| user.name = name).await
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let hash = password_hash.to_string();
        self.modify_user(id, move |user| user.password_hash = hash)
            .await
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, RepositoryError> {
        self.modify_user(id, move |user| user.role = role).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let removed = tables.users.remove(&id).is_some();
        if removed {
            tables.posts.retain(|_, post| post.author_id != id);
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepositoryError::Database(format!(
                "insert on table \"posts\" violates foreign key constraint (author {})",
                post.author_id
            )));
        }

        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            published: post.published,
            author_id: post.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepositoryError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).and_then(|post| tables.with_author(post)))
    }

    async fn list_published(&self) -> Result<Vec<PostWithAuthor>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<PostWithAuthor> = tables
            .posts
            .values()
            .filter(|post| post.published)
            .filter_map(|post| tables.with_author(post))
            .collect();
        posts.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        Ok(posts)
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|post| post.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<Post>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.posts.get_mut(&id).map(|post| {
            if let Some(title) = changes.title {
                post.title = title;
            }
            if let Some(content) = changes.content {
                post.content = content;
            }
            if let Some(published) = changes.published {
                post.published = published;
            }
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.posts.remove(&id).is_some())
    }
}
