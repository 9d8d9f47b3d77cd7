//! Error rendering layer
//!
//! Every `AppError` response carries its [`NormalizedError`] in the response
//! extensions. This layer logs it and renders the body for the configured
//! environment mode: development shows everything, production hides the
//! detail of non-operational failures.
//!
//! Author: hephaex@gmail.com

use crate::error::NormalizedError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use blog_core::Environment;

pub async fn render_errors(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let Some(error) = response.extensions().get::<NormalizedError>().cloned() else {
        return response;
    };

    if error.operational {
        tracing::warn!(
            %method,
            %path,
            kind = %error.kind,
            status = error.status.as_u16(),
            "{}",
            error.message
        );
    } else {
        tracing::error!(
            %method,
            %path,
            kind = %error.kind,
            status = error.status.as_u16(),
            trace = ?error.trace,
            "{}",
            error.message
        );
    }

    let mut rendered = error.render(environment);
    for (name, value) in response.headers() {
        if !rendered.headers().contains_key(name) {
            rendered.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn failing() -> Result<(), AppError> {
        Err(AppError::Database(
            "relation \"users\" does not exist".to_string(),
        ))
    }

    async fn missing() -> Result<(), AppError> {
        Err(AppError::NotFound("Post not found".to_string()))
    }

    fn app(environment: Environment) -> Router {
        Router::new()
            .route("/fail", get(failing))
            .route("/missing", get(missing))
            .route("/ok", get(|| async { "fine" }))
            .layer(middleware::from_fn_with_state(environment, render_errors))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_production_masks_database_detail() {
        let (status, json) = call(app(Environment::Production), "/fail").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Something went wrong");
        assert!(!json.to_string().contains("relation"));
    }

    #[tokio::test]
    async fn test_development_exposes_database_detail() {
        let (status, json) = call(app(Environment::Development), "/fail").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["kind"], "database-error");
        assert_eq!(json["error"]["statusCode"], 500);
        assert!(json["message"].as_str().unwrap().contains("relation"));
        assert!(json["trace"].is_array());
    }

    #[tokio::test]
    async fn test_operational_error_keeps_status_in_production() {
        let (status, json) = call(app(Environment::Production), "/missing").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Post not found");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = app(Environment::Development)
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
