//! Blog API - REST server
//!
//! HTTP endpoints for user accounts, authentication and blog posts.
//!
//! Author: hephaex@gmail.com

pub mod audit;
pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod state;

use crate::error::AppError;
use crate::handlers::health;
use crate::middleware::{render_errors, security_headers_middleware};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Uri},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router
///
/// Layer order, outermost first: security headers, CORS, request tracing,
/// error rendering, then the routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let environment = state.environment();
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/api", routes::api_routes(state.clone()))
        .fallback(not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(environment, render_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(security_headers_middleware))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Not found - {}", uri.path()))
}

/// Any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Application state over an in-memory store with cheap hashing
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(environment: blog_core::Environment) -> Arc<AppState> {
    use blog_core::{AppConfig, AuthConfig, MemoryStore, PasswordHashConfig};

    let config = AppConfig {
        auth: AuthConfig {
            jwt_secret: "test-secret-do-not-use-in-production".to_string(),
            password_hash: PasswordHashConfig {
                memory_cost: 8192,
                time_cost: 1,
                parallelism: 1,
            },
            ..Default::default()
        },
        environment,
        ..Default::default()
    };

    let store = MemoryStore::new();
    let state = AppState::with_repositories(config, Arc::new(store.clone()), Arc::new(store))
        .expect("test password parameters are valid");
    Arc::new(state)
}

/// Router over [`create_test_state`] in development mode
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_router(create_test_state(blog_core::Environment::Development))
}
