//! Success envelope shared by all endpoints
//!
//! Author: hephaex@gmail.com

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use blog_core::{Post, PostWithAuthor, UserPublic};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{status, token?, results?, message?, data?}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    UserResponse = ApiResponse<UserData>,
    UserListResponse = ApiResponse<UserListData>,
    PostResponse = ApiResponse<PostData>,
    PostDetailResponse = ApiResponse<PostDetailData>,
    PostListResponse = ApiResponse<PostListData>,
    MyPostsResponse = ApiResponse<MyPostsData>
)]
pub struct ApiResponse<T> {
    /// Always `"success"`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Item count for list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            token: None,
            results: None,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_results(mut self, results: usize) -> Self {
        self.results = Some(results);
        self
    }
}

impl ApiResponse<()> {
    /// Envelope without a data member
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            token: None,
            results: None,
            message: Some(message.into()),
            data: None,
        }
    }

    /// `data: null`, returned by deletions
    pub fn deleted() -> Self {
        Self::success(())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserData {
    pub user: UserPublic,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListData {
    pub users: Vec<UserPublic>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostData {
    pub post: Post,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostDetailData {
    pub post: PostWithAuthor,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostListData {
    pub posts: Vec<PostWithAuthor>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MyPostsData {
    pub posts: Vec<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deleted_serializes_null_data() {
        let value = serde_json::to_value(ApiResponse::deleted()).unwrap();
        assert_eq!(value, json!({"status": "success", "data": null}));
    }

    #[test]
    fn test_message_omits_data() {
        let value = serde_json::to_value(
            ApiResponse::message("Password updated successfully").with_token("t".to_string()),
        )
        .unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "token": "t",
                "message": "Password updated successfully"
            })
        );
    }

    #[test]
    fn test_list_carries_results() {
        let value =
            serde_json::to_value(ApiResponse::success(vec![1, 2, 3]).with_results(3)).unwrap();
        assert_eq!(value["results"], 3);
        assert_eq!(value["data"], json!([1, 2, 3]));
    }
}
