//! Administrative user management
//!
//! Every route here sits behind `auth_middleware` and `require_admin`.
//!
//! Author: hephaex@gmail.com

use crate::audit::{audit_log, AuditEvent};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::{PathId, ValidatedJson};
use crate::response::{ApiResponse, UserData, UserListData};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Extension};
use blog_core::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

/// Role change request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = UserListResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<_> = state
        .users
        .list()
        .await?
        .iter()
        .map(|user| user.to_public())
        .collect();
    let count = users.len();

    Ok(ApiResponse::success(UserListData { users }).with_results(count))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.find_by_id(id).await?.ok_or_else(user_not_found)?;

    Ok(ApiResponse::success(UserData {
        user: user.to_public(),
    }))
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Unknown role", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthenticatedUser>,
    PathId(id): PathId,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .update_role(id, request.role)
        .await?
        .ok_or_else(user_not_found)?;

    audit_log(&AuditEvent::RoleChange {
        actor_id: admin.user_id,
        target_id: user.id,
        new_role: user.role,
    });

    Ok(ApiResponse::success(UserData {
        user: user.to_public(),
    }))
}

/// Delete a user and, by cascade, their posts
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthenticatedUser>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    if !state.users.delete(id).await? {
        return Err(user_not_found());
    }

    audit_log(&AuditEvent::UserDeleted {
        actor_id: admin.user_id,
        target_id: id,
    });

    Ok(ApiResponse::deleted())
}
