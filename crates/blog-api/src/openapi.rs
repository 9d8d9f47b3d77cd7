//! OpenAPI document served at `/api-docs/openapi.json`
//!
//! Author: hephaex@gmail.com

use crate::auth::{LoginRequest, RegisterRequest, UpdateMeRequest, UpdatePasswordRequest};
use crate::error::ErrorBody;
use crate::handlers::{self, health::HealthResponse, posts, users};
use crate::response::{
    MyPostsData, MyPostsResponse, PostData, PostDetailData, PostDetailResponse, PostListData,
    PostListResponse, PostResponse, UserData, UserListData, UserListResponse, UserResponse,
};
use axum::Json;
use blog_core::{AuthorSummary, Post, PostWithAuthor, Role, UserPublic};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "Blog API", description = "Users, authentication and blog posts"),
    paths(
        handlers::health::health_check,
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::me_handler,
        handlers::auth::update_me_handler,
        handlers::auth::update_password_handler,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        posts::list_posts,
        posts::get_post,
        posts::create_post,
        posts::my_posts,
        posts::update_post,
        posts::delete_post,
    ),
    components(schemas(
        ErrorBody,
        HealthResponse,
        RegisterRequest,
        LoginRequest,
        UpdateMeRequest,
        UpdatePasswordRequest,
        users::UpdateRoleRequest,
        posts::CreatePostRequest,
        posts::UpdatePostRequest,
        Role,
        UserPublic,
        Post,
        AuthorSummary,
        PostWithAuthor,
        UserData,
        UserListData,
        PostData,
        PostDetailData,
        PostListData,
        MyPostsData,
        UserResponse,
        UserListResponse,
        PostResponse,
        PostDetailResponse,
        PostListResponse,
        MyPostsResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Registration, login and own profile"),
        (name = "users", description = "Administrative user management"),
        (name = "posts", description = "Blog posts"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
