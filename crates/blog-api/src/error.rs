//! API error handling
//!
//! `AppError` is the single failure type handlers and middleware return.
//! Each failure gets its kind where it originates; `NormalizedError` is the
//! uniform shape the rendering layer turns into a response for the current
//! environment mode.
//!
//! Author: hephaex@gmail.com

use crate::auth::jwt::TokenError;
use crate::auth::password::PasswordError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blog_core::{Environment, RepositoryError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Message returned in production for failures whose detail is masked
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Error body as seen by clients in production
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `"error"`
    pub status: String,
    /// Human-readable message
    pub message: String,
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    ValidationError,
    Conflict,
    AuthRequired,
    InvalidCredentials,
    InvalidToken,
    TokenExpired,
    Forbidden,
    NotFound,
    DatabaseError,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation-error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::AuthRequired => "auth-required",
            ErrorKind::InvalidCredentials => "invalid-credentials",
            ErrorKind::InvalidToken => "invalid-token",
            ErrorKind::TokenExpired => "token-expired",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::DatabaseError => "database-error",
            ErrorKind::InternalError => "internal-error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::ValidationError | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::AuthRequired
            | ErrorKind::InvalidCredentials
            | ErrorKind::InvalidToken
            | ErrorKind::TokenExpired => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DatabaseError | ErrorKind::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Operational failures are anticipated and safe to describe to clients
    pub fn is_operational(&self) -> bool {
        !matches!(self, ErrorKind::DatabaseError | ErrorKind::InternalError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    AuthRequired(String),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    TokenExpired(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn auth_required() -> Self {
        AppError::AuthRequired("You are not logged in. Please log in to get access.".to_string())
    }

    pub fn invalid_token() -> Self {
        AppError::InvalidToken("Invalid token. Please log in again!".to_string())
    }

    pub fn token_expired() -> Self {
        AppError::TokenExpired("Your token has expired! Please log in again.".to_string())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(anyhow::anyhow!(message.into()))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::ValidationError,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::AuthRequired(_) => ErrorKind::AuthRequired,
            AppError::InvalidCredentials(_) => ErrorKind::InvalidCredentials,
            AppError::InvalidToken(_) => ErrorKind::InvalidToken,
            AppError::TokenExpired(_) => ErrorKind::TokenExpired,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Database(_) => ErrorKind::DatabaseError,
            AppError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Entry point for opaque `anyhow` errors, also reached through
    /// `From<anyhow::Error>`. Typed failures convert where they originate
    /// and never pass through here.
    ///
    /// First match wins: validation, database, invalid token, expired token,
    /// an already classified `AppError`, and finally internal.
    pub fn classify(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ValidationErrors>() {
            Ok(errors) => return errors.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<RepositoryError>() {
            Ok(repo) => return repo.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<sqlx::Error>() {
            Ok(db) => return AppError::Database(db.to_string()),
            Err(err) => err,
        };
        match err.downcast_ref::<TokenError>() {
            Some(TokenError::Invalid) => return AppError::invalid_token(),
            Some(TokenError::Expired) => return AppError::token_expired(),
            _ => {}
        }
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(err) => AppError::Internal(err),
        }
    }

    /// Reduce to the uniform error shape
    pub fn normalize(&self) -> NormalizedError {
        let kind = self.kind();
        let trace = match self {
            AppError::Internal(err) => err.chain().map(|cause| cause.to_string()).collect(),
            other => vec![format!("{other:?}")],
        };

        NormalizedError {
            kind,
            status: kind.status(),
            message: self.to_string(),
            operational: kind.is_operational(),
            trace,
        }
    }
}

/// Uniform failure shape consumed by the rendering layer
#[derive(Debug, Clone)]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub status: StatusCode,
    pub message: String,
    pub operational: bool,
    /// Error source chain, only shown in development
    pub trace: Vec<String>,
}

impl NormalizedError {
    /// Render the client-facing response for `environment`
    pub fn render(&self, environment: Environment) -> Response {
        match environment {
            Environment::Development => (
                self.status,
                Json(json!({
                    "status": "error",
                    "error": {
                        "kind": self.kind,
                        "statusCode": self.status.as_u16(),
                        "operational": self.operational,
                    },
                    "message": self.message,
                    "trace": self.trace,
                })),
            )
                .into_response(),
            Environment::Production if self.operational => (
                self.status,
                Json(ErrorBody {
                    status: "error".to_string(),
                    message: self.message.clone(),
                }),
            )
                .into_response(),
            Environment::Production => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    status: "error".to_string(),
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

impl IntoResponse for AppError {
    /// Renders the production-safe body and attaches the normalized error
    /// so `render_errors` can log it and re-render for the active mode.
    fn into_response(self) -> Response {
        let normalized = self.normalize();
        let mut response = normalized.render(Environment::Production);
        response.extensions_mut().insert(normalized);
        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::classify(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) | RepositoryError::Database(msg) => {
                AppError::Database(msg)
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AppError::invalid_token(),
            TokenError::Expired => AppError::token_expired(),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {field}"))
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join(", "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}
