//! Authentication middleware for protecting routes
//!
//! Extracts and verifies the bearer token from the Authorization header,
//! re-reads the identity it names from the user store, and adds it to the
//! request extensions.

use super::authorize;
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use blog_core::{Role, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated user attached to the request
///
/// Extract in handlers with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Expiry of the presented token (Unix epoch seconds)
    pub token_expires_at: u64,
}

impl AuthenticatedUser {
    pub fn new(user: &User, token_expires_at: u64) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            token_expires_at,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Bearer token from the Authorization header, if present and well-formed
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that requires a valid token
///
/// ```ignore
/// let protected = Router::new()
///     .route("/auth/me", get(auth::me_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or_else(AppError::auth_required)?;

    let verified = state
        .tokens
        .decode(token)
        .and_then(|claims| Ok((claims.user_id()?, claims.exp)));

    let (user_id, expires_at) = match verified {
        Ok(verified) => verified,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                client: ClientInfo::from_headers(request.headers()),
            });
            return Err(e.into());
        }
    };

    let Some(user) = state.users.find_by_id(user_id).await? else {
        audit_log(&AuditEvent::InvalidToken {
            reason: format!("User {user_id} no longer exists"),
            client: ClientInfo::from_headers(request.headers()),
        });
        return Err(AppError::InvalidToken(
            "The user belonging to this token no longer exists".to_string(),
        ));
    };

    tracing::debug!(user_id = %user.id, role = %user.role, "Request authenticated");
    request
        .extensions_mut()
        .insert(AuthenticatedUser::new(&user, expires_at));

    Ok(next.run(request).await)
}

/// Route layer admitting only administrators
///
/// Must run after `auth_middleware`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(AppError::auth_required)?;

    if let Err(denied) = authorize::require_role(user, &[Role::Admin]) {
        audit_log(&AuditEvent::AccessDenied {
            user_id: user.user_id,
            resource: request.uri().path().to_string(),
            required_roles: vec![Role::Admin],
        });
        return Err(denied);
    }

    Ok(next.run(request).await)
}
