//! JWT token generation and validation
//!
//! Implements stateless HMAC-SHA256 tokens carrying the user id and an
//! expiration instant. A token is accepted only if its signature verifies and
//! its `exp` lies in the future; no leeway is granted.

use blog_core::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

impl Claims {
    /// Subject parsed as a user id
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid)
    }
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("System time error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

/// Issues and verifies identity tokens
///
/// Built once from [`AuthConfig`] and shared through the application state.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime_secs: u64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            lifetime_secs: config.token_lifetime_secs,
        }
    }

    /// Sign a token for `user_id` expiring after the configured lifetime
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.lifetime_secs,
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding_key,
        )?)
    }

    /// Validate signature, issuer and expiry and return the claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            },
        )?;

        // Validation alone only rejects `exp < now`
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        if token_data.claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }

    /// Validate a token and return the embedded user id
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.decode(token)?.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            token_lifetime_secs: 3600,
            ..Default::default()
        }
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn test_issue_and_verify_token() {
        let service = TokenService::new(&config("test-secret"));
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).expect("Failed to issue token");
        assert_eq!(service.verify(&token).unwrap(), user_id);

        let claims = service.decode(&token).unwrap();
        assert_eq!(claims.iss, "blog-api");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_malformed_token() {
        let service = TokenService::new(&config("test-secret"));
        assert!(matches!(
            service.verify("invalid.token.here"),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(service.verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_secret() {
        let signer = TokenService::new(&config("secret1"));
        let verifier = TokenService::new(&config("secret2"));

        let token = signer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_tampered_payload() {
        let service = TokenService::new(&config("test-secret"));
        let token = service.issue(Uuid::new_v4()).unwrap();
        let other = service.issue(Uuid::new_v4()).unwrap();

        // Header and signature from one token, payload from another
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(service.verify(&forged), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_issuer() {
        let service = TokenService::new(&config("test-secret"));
        let foreign = TokenService::new(&AuthConfig {
            issuer: "someone-else".to_string(),
            ..config("test-secret")
        });

        let token = foreign.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_non_uuid_subject() {
        let service = TokenService::new(&config("test-secret"));
        let token = service
            .sign(&Claims {
                iss: "blog-api".to_string(),
                sub: "42".to_string(),
                iat: now(),
                exp: now() + 60,
            })
            .unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_expired_token() {
        let service = TokenService::new(&config("test-secret"));
        let token = service
            .sign(&Claims {
                iss: "blog-api".to_string(),
                sub: Uuid::new_v4().to_string(),
                iat: now() - 7200,
                exp: now() - 3600,
            })
            .unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_expiring_now_is_rejected() {
        let service = TokenService::new(&config("test-secret"));
        let now = now();
        let token = service
            .sign(&Claims {
                iss: "blog-api".to_string(),
                sub: Uuid::new_v4().to_string(),
                iat: now - 10,
                exp: now,
            })
            .unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_zero_lifetime_token_is_expired() {
        let service = TokenService::new(&AuthConfig {
            token_lifetime_secs: 0,
            ..config("test-secret")
        });
        let token = service.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_expires_after_lifetime() {
        let service = TokenService::new(&AuthConfig {
            token_lifetime_secs: 1,
            ..config("test-secret")
        });
        let user_id = Uuid::new_v4();
        let token = service.issue(user_id).unwrap();

        assert_eq!(service.verify(&token).unwrap(), user_id);

        std::thread::sleep(std::time::Duration::from_millis(2100));
        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }
}
