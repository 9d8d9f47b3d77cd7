//! Security audit logging
//!
//! Account and access-control events are logged at INFO level on the
//! `audit` target so they can be filtered and routed separately from
//! application logs. Each record carries the event serialized as JSON.
//!
//! ```ignore
//! use blog_api::audit::{audit_log, AuditEvent, ClientInfo};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     email: user.email.clone(),
//!     client: ClientInfo::from_headers(&headers),
//! });
//! ```
//!
//! Author: hephaex@gmail.com

use axum::http::{header, HeaderMap};
use blog_core::Role;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Caller details taken from request headers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    RegistrationSuccess {
        user_id: Uuid,
        email: String,
        role: Role,
        client: ClientInfo,
    },

    RegistrationFailure {
        email: String,
        reason: String,
        client: ClientInfo,
    },

    LoginSuccess {
        user_id: Uuid,
        email: String,
        client: ClientInfo,
    },

    LoginFailure {
        email: String,
        reason: String,
        client: ClientInfo,
    },

    PasswordChange {
        user_id: Uuid,
        email: String,
        client: ClientInfo,
    },

    /// Bearer token rejected by the authentication middleware
    InvalidToken { reason: String, client: ClientInfo },

    AccessDenied {
        user_id: Uuid,
        resource: String,
        required_roles: Vec<Role>,
    },

    RoleChange {
        actor_id: Uuid,
        target_id: Uuid,
        new_role: Role,
    },

    UserDeleted { actor_id: Uuid, target_id: Uuid },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::RegistrationSuccess { .. } => "Registration successful",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::PasswordChange { .. } => "Password changed",
            AuditEvent::InvalidToken { .. } => "Invalid token",
            AuditEvent::AccessDenied { .. } => "Access denied",
            AuditEvent::RoleChange { .. } => "Role changed",
            AuditEvent::UserDeleted { .. } => "User deleted",
        }
    }

    fn user_id(&self) -> Option<Uuid> {
        match self {
            AuditEvent::RegistrationSuccess { user_id, .. }
            | AuditEvent::LoginSuccess { user_id, .. }
            | AuditEvent::PasswordChange { user_id, .. }
            | AuditEvent::AccessDenied { user_id, .. } => Some(*user_id),
            AuditEvent::RoleChange { actor_id, .. } | AuditEvent::UserDeleted { actor_id, .. } => {
                Some(*actor_id)
            }
            _ => None,
        }
    }

    fn ip_address(&self) -> Option<&str> {
        match self {
            AuditEvent::RegistrationSuccess { client, .. }
            | AuditEvent::RegistrationFailure { client, .. }
            | AuditEvent::LoginSuccess { client, .. }
            | AuditEvent::LoginFailure { client, .. }
            | AuditEvent::PasswordChange { client, .. }
            | AuditEvent::InvalidToken { client, .. } => client.ip_address.as_deref(),
            _ => None,
        }
    }
}

/// Log a security audit event on the `audit` target
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    info!(
        target: "audit",
        timestamp = %Utc::now(),
        event = %event_json,
        user_id = ?event.user_id(),
        ip_address = ?event.ip_address(),
        "{}",
        event.summary()
    );
}

/// Client IP from proxy headers, first hop of X-Forwarded-For wins
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|xff| xff.to_str().ok())
        .and_then(|xff| xff.split(',').next())
    {
        return Some(first_ip.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|ip| ip.to_str().ok())
        .map(|ip| ip.to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::RoleChange {
            actor_id: Uuid::new_v4(),
            target_id: Uuid::new_v4(),
            new_role: Role::Admin,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"role_change\""));
        assert!(json.contains("\"new_role\":\"ADMIN\""));
    }

    #[test]
    fn test_audit_log_does_not_panic() {
        audit_log(&AuditEvent::LoginFailure {
            email: "test@example.com".to_string(),
            reason: "Incorrect email or password".to_string(),
            client: ClientInfo {
                ip_address: Some("192.168.1.1".to_string()),
                user_agent: Some("Test Agent".to_string()),
            },
        });
        audit_log(&AuditEvent::UserDeleted {
            actor_id: Uuid::new_v4(),
            target_id: Uuid::new_v4(),
        });
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_client_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, "Mozilla/5.0 (Test)".parse().unwrap());

        let client = ClientInfo::from_headers(&headers);
        assert_eq!(client.user_agent.as_deref(), Some("Mozilla/5.0 (Test)"));
        assert_eq!(client.ip_address, None);
    }
}
