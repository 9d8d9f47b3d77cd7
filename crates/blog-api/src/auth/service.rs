//! Authentication service
//!
//! Account flows over the user repository, the password hasher and the
//! token service: registration, login and password change.

use super::password::validate_password_strength;
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use crate::state::AppState;
use blog_core::{NewUser, Role, User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(custom(function = "name_present"))]
    pub name: String,

    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,

    #[validate(custom(function = "password_rules"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Please provide both current and new password"))]
    pub current_password: String,

    #[validate(custom(function = "password_rules"))]
    pub new_password: String,
}

/// Profile update request
///
/// Only the name can be changed here; a `password` member is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateMeRequest {
    #[validate(custom(function = "name_present"))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn rule_violation(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn name_present(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(rule_violation("required", "Name is required".to_string()));
    }
    Ok(())
}

fn password_rules(password: &str) -> Result<(), ValidationError> {
    validate_password_strength(password).map_err(|message| rule_violation("password", message))
}

/// Emails are compared case-insensitively
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create a standard user and sign a token for it
    ///
    /// # Errors
    ///
    /// * `AppError::Conflict` - email already registered
    /// * `AppError::Database` - store failure, including a concurrent insert
    ///   of the same email
    pub async fn register(
        &self,
        request: RegisterRequest,
        client: ClientInfo,
    ) -> Result<(User, String), AppError> {
        let email = normalize_email(&request.email);

        if self.state.users.find_by_email(&email).await?.is_some() {
            audit_log(&AuditEvent::RegistrationFailure {
                email,
                reason: "Email already registered".to_string(),
                client,
            });
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = self.state.passwords.hash(&request.password).await?;

        let user = self
            .state
            .users
            .create(NewUser {
                name: request.name.trim().to_string(),
                email,
                password_hash,
                role: Role::User,
            })
            .await?;

        let token = self.state.tokens.issue(user.id)?;

        audit_log(&AuditEvent::RegistrationSuccess {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            client,
        });
        tracing::info!(user_id = %user.id, "User registered");

        Ok((user, token))
    }

    /// Check credentials and sign a token
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(
        &self,
        request: LoginRequest,
        client: ClientInfo,
    ) -> Result<(User, String), AppError> {
        let email = normalize_email(&request.email);

        let found = self.state.users.find_by_email(&email).await?;
        let verified = match &found {
            Some(user) => {
                self.state
                    .passwords
                    .verify(&request.password, &user.password_hash)
                    .await?
            }
            None => false,
        };

        let user = match found {
            Some(user) if verified => user,
            found => {
                audit_log(&AuditEvent::LoginFailure {
                    email,
                    reason: if found.is_some() {
                        "Wrong password".to_string()
                    } else {
                        "Unknown email".to_string()
                    },
                    client,
                });
                return Err(AppError::InvalidCredentials("Invalid credentials".to_string()));
            }
        };

        let token = self.state.tokens.issue(user.id)?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id,
            email: user.email.clone(),
            client,
        });

        Ok((user, token))
    }

    /// Replace the password after re-checking the current one
    ///
    /// Returns a fresh token.
    pub async fn update_password(
        &self,
        user_id: Uuid,
        request: UpdatePasswordRequest,
        client: ClientInfo,
    ) -> Result<String, AppError> {
        let user = self
            .state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !self
            .state
            .passwords
            .verify(&request.current_password, &user.password_hash)
            .await?
        {
            return Err(AppError::InvalidCredentials(
                "Your current password is incorrect".to_string(),
            ));
        }

        let password_hash = self.state.passwords.hash(&request.new_password).await?;
        self.state
            .users
            .update_password(user.id, &password_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let token = self.state.tokens.issue(user.id)?;

        audit_log(&AuditEvent::PasswordChange {
            user_id: user.id,
            email: user.email,
            client,
        });

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_rules() {
        let valid = RegisterRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Passw0rd!".to_string(),
        };
        assert!(valid.validate().is_ok());

        let weak = RegisterRequest {
            password: "password".to_string(),
            ..valid.clone()
        };
        let errors = weak.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let blank_name = RegisterRequest {
            name: "   ".to_string(),
            ..valid.clone()
        };
        assert!(blank_name.validate().is_err());

        let bad_email = RegisterRequest {
            email: "alice".to_string(),
            ..valid
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_update_me_without_name_is_valid() {
        assert!(UpdateMeRequest::default().validate().is_ok());
        let blank = UpdateMeRequest {
            name: Some(String::new()),
            password: None,
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_update_password_request_uses_camel_case() {
        let request: UpdatePasswordRequest = serde_json::from_value(serde_json::json!({
            "currentPassword": "Passw0rd!",
            "newPassword": "N3wPassword!"
        }))
        .unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
