//! Post handlers
//!
//! Reads of published posts are public. Writes require authentication, and
//! changing or deleting a post requires being its author or an admin.
//!
//! Author: hephaex@gmail.com

use crate::audit::{audit_log, AuditEvent};
use crate::auth::{require_ownership_or_role, AuthenticatedUser};
use crate::error::AppError;
use crate::extract::{PathId, ValidatedJson};
use crate::response::{ApiResponse, MyPostsData, PostData, PostDetailData, PostListData};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use blog_core::{NewPost, Post, PostChanges, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// New post
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(custom(function = "title_present"))]
    pub title: String,

    #[validate(custom(function = "content_present"))]
    pub content: String,

    /// Defaults to a draft
    #[serde(default)]
    pub published: bool,
}

/// Partial post update; absent members are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(custom(function = "title_present"))]
    pub title: Option<String>,

    #[validate(custom(function = "content_present"))]
    pub content: Option<String>,

    pub published: Option<bool>,
}

fn required(value: &str, code: &'static str, message: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());
        return Err(error);
    }
    Ok(())
}

fn title_present(title: &str) -> Result<(), ValidationError> {
    required(title, "title", "Title is required")
}

fn content_present(content: &str) -> Result<(), ValidationError> {
    required(content, "content", "Content is required")
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

/// Author or admin may modify a post
fn ensure_can_modify(user: &AuthenticatedUser, post: &Post, action: &str) -> Result<(), AppError> {
    require_ownership_or_role(user, post.author_id, &[Role::Admin]).map_err(|_| {
        audit_log(&AuditEvent::AccessDenied {
            user_id: user.user_id,
            resource: format!("post:{}", post.id),
            required_roles: vec![Role::Admin],
        });
        AppError::Forbidden(format!("You are not authorized to {action} this post"))
    })
}

/// List published posts, newest first
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    responses(
        (status = 200, description = "Published posts", body = PostListResponse),
    )
)]
pub async fn list_posts(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let posts = state.posts.list_published().await?;
    let count = posts.len();

    Ok(ApiResponse::success(PostListData { posts }).with_results(count))
}

/// Get a post with its author
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = uuid::Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post found", body = PostDetailResponse),
        (status = 404, description = "Post not found", body = crate::error::ErrorBody),
    )
)]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let post = state
        .posts
        .find_with_author(id)
        .await?
        .ok_or_else(post_not_found)?;

    Ok(ApiResponse::success(PostDetailData { post }))
}

/// Create a post owned by the caller
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = state
        .posts
        .create(NewPost {
            title: request.title.trim().to_string(),
            content: request.content.trim().to_string(),
            published: request.published,
            author_id: user.user_id,
        })
        .await?;

    tracing::info!(post_id = %post.id, author_id = %user.user_id, "Post created");

    Ok((StatusCode::CREATED, ApiResponse::success(PostData { post })))
}

/// List the caller's posts, drafts included
#[utoipa::path(
    get,
    path = "/api/posts/my/posts",
    tag = "posts",
    responses(
        (status = 200, description = "Caller's posts", body = MyPostsResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_posts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let posts = state.posts.list_by_author(user.user_id).await?;
    let count = posts.len();

    Ok(ApiResponse::success(MyPostsData { posts }).with_results(count))
}

/// Update a post
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = uuid::Uuid, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 403, description = "Not the author or an admin", body = crate::error::ErrorBody),
        (status = 404, description = "Post not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(id): PathId,
    ValidatedJson(request): ValidatedJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = state.posts.find_by_id(id).await?.ok_or_else(post_not_found)?;
    ensure_can_modify(&user, &post, "update")?;

    let changes = PostChanges {
        title: request.title.map(|t| t.trim().to_string()),
        content: request.content.map(|c| c.trim().to_string()),
        published: request.published,
    };
    let post = state
        .posts
        .update(id, changes)
        .await?
        .ok_or_else(post_not_found)?;

    Ok(ApiResponse::success(PostData { post }))
}

/// Delete a post
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = uuid::Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 403, description = "Not the author or an admin", body = crate::error::ErrorBody),
        (status = 404, description = "Post not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let post = state.posts.find_by_id(id).await?.ok_or_else(post_not_found)?;
    ensure_can_modify(&user, &post, "delete")?;

    if !state.posts.delete(id).await? {
        return Err(post_not_found());
    }

    Ok(ApiResponse::deleted())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_post_defaults_to_draft() {
        let request: CreatePostRequest =
            serde_json::from_str(r#"{"title":"Hello","content":"World"}"#).unwrap();
        assert!(!request.published);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let request = CreatePostRequest {
            title: "  ".to_string(),
            content: "Body".to_string(),
            published: false,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_partial_update_is_valid() {
        let request = UpdatePostRequest {
            published: Some(true),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }
}
