//! Authentication and authorization module
//!
//! - Token issue and verification (HS256)
//! - Password hashing with Argon2id
//! - Middleware for request authentication and the admin gate
//! - Role and ownership checks
//! - Account flows (register, login, password change)

pub mod authorize;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use authorize::{require_ownership_or_role, require_role};
pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{auth_middleware, require_admin, AuthenticatedUser};
pub use password::{validate_password_strength, PasswordError, PasswordService};
pub use service::{
    AuthService, LoginRequest, RegisterRequest, UpdateMeRequest, UpdatePasswordRequest,
};
