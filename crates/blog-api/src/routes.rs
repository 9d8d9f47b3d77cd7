//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::middleware::{auth_middleware, require_admin};
use crate::handlers::{auth, posts, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Routes mounted under `/api`
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let authenticate = middleware::from_fn_with_state(state, auth_middleware);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/posts", get(posts::list_posts))
        .route("/posts/:id", get(posts::get_post));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/updateme", put(auth::update_me_handler))
        .route("/auth/updatepassword", put(auth::update_password_handler))
        .route("/posts", post(posts::create_post))
        .route("/posts/my/posts", get(posts::my_posts))
        .route(
            "/posts/:id",
            put(posts::update_post).delete(posts::delete_post),
        )
        .route_layer(authenticate.clone());

    // Admin routes; layers run bottom-up so authentication comes first
    let admin_routes = Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(authenticate);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
}
