//! Role and ownership checks
//!
//! Pure decisions over an [`AuthenticatedUser`]; callers decide what to log.

use super::middleware::AuthenticatedUser;
use crate::error::AppError;
use blog_core::Role;
use uuid::Uuid;

const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action";

/// Allow only users holding one of `roles`
pub fn require_role(user: &AuthenticatedUser, roles: &[Role]) -> Result<(), AppError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
    }
}

/// Allow the owner of a resource, or users holding one of `roles`
pub fn require_ownership_or_role(
    user: &AuthenticatedUser,
    owner_id: Uuid,
    roles: &[Role],
) -> Result<(), AppError> {
    if user.user_id == owner_id {
        return Ok(());
    }
    require_role(user, roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
            token_expires_at: 0,
        }
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&user(Role::Admin), &[Role::Admin]).is_ok());
        assert!(require_role(&user(Role::User), &[Role::User, Role::Admin]).is_ok());

        let denied = require_role(&user(Role::User), &[Role::Admin]);
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        // No roles listed means nobody passes
        assert!(require_role(&user(Role::Admin), &[]).is_err());
    }

    #[test]
    fn test_owner_passes_without_role() {
        let owner = user(Role::User);
        assert!(require_ownership_or_role(&owner, owner.user_id, &[Role::Admin]).is_ok());
    }

    #[test]
    fn test_admin_passes_without_ownership() {
        let admin = user(Role::Admin);
        assert!(require_ownership_or_role(&admin, Uuid::new_v4(), &[Role::Admin]).is_ok());
    }

    #[test]
    fn test_stranger_is_forbidden() {
        let stranger = user(Role::User);
        let result = require_ownership_or_role(&stranger, Uuid::new_v4(), &[Role::Admin]);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
