//! Authentication API handlers
//!
//! Registration, login and self-service profile endpoints.
//!
//! Author: hephaex@gmail.com

use crate::audit::ClientInfo;
use crate::auth::{
    AuthService, AuthenticatedUser, LoginRequest, RegisterRequest, UpdateMeRequest,
    UpdatePasswordRequest,
};
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::response::{ApiResponse, UserData};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension,
};
use std::sync::Arc;

/// Register a new user account
///
/// New accounts always get the `USER` role. The response carries a token so
/// the client is signed in immediately.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Invalid input or email already registered", body = crate::error::ErrorBody),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = AuthService::new(&state)
        .register(request, ClientInfo::from_headers(&headers))
        .await?;

    let body = ApiResponse::success(UserData {
        user: user.to_public(),
    })
    .with_token(token);

    Ok((StatusCode::CREATED, body))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = AuthService::new(&state)
        .login(request, ClientInfo::from_headers(&headers))
        .await?;

    Ok(ApiResponse::success(UserData {
        user: user.to_public(),
    })
    .with_token(token))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_by_id(current.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::success(UserData {
        user: user.to_public(),
    }))
}

/// Update own profile
///
/// Only the name can change. Password changes go through
/// `/api/auth/updatepassword`.
#[utoipa::path(
    put,
    path = "/api/auth/updateme",
    tag = "auth",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input or password supplied", body = crate::error::ErrorBody),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<UpdateMeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.password.is_some() {
        return Err(AppError::Validation(
            "This route is not for password updates. Please use /updatepassword.".to_string(),
        ));
    }

    let updated = match request.name {
        Some(name) => state.users.update_name(current.user_id, name.trim()).await?,
        None => state.users.find_by_id(current.user_id).await?,
    }
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::success(UserData {
        user: updated.to_public(),
    }))
}

/// Change own password
///
/// Requires the current password and returns a fresh token.
#[utoipa::path(
    put,
    path = "/api/auth/updatepassword",
    tag = "auth",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated, new token issued"),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 401, description = "Current password is incorrect", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = AuthService::new(&state)
        .update_password(current.user_id, request, ClientInfo::from_headers(&headers))
        .await?;

    Ok(ApiResponse::message("Password updated successfully").with_token(token))
}
