//! Password hashing and verification using Argon2id
//!
//! Each hash carries its own random 16-byte salt and cost parameters in PHC
//! string format, so hashing the same password twice yields different
//! digests and verification needs nothing but the stored string.
//!
//! Hashing is CPU and memory bound; `PasswordService` runs it on the
//! blocking thread pool so request tasks are not stalled.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use blog_core::PasswordHashConfig;
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Password task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Characters accepted as the "special character" in a password
const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Async facade over Argon2id with configured cost parameters
#[derive(Debug, Clone)]
pub struct PasswordService {
    params: Params,
}

impl PasswordService {
    pub fn new(config: &PasswordHashConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_cost,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(Self { params })
    }

    /// Hash a plaintext password
    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let params = self.params.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hash_password_with_params(&password, params)).await?
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// A mismatch is `Ok(false)`; only an unreadable hash is an error.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
    }
}

/// Hash a password with explicit Argon2id parameters
///
/// # Returns
///
/// * `Ok(String)` - PHC string format hash (algorithm, parameters, salt, hash)
/// * `Err(PasswordError)` - If hashing fails
pub fn hash_password_with_params(password: &str, params: Params) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// # Returns
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(PasswordError)` - If the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Parameters come from the PHC string, not from this instance
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Validate password strength
///
/// Checks the registration rules:
/// - At least 8 characters
/// - At least 1 digit
/// - At least 1 special character
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }

    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> PasswordService {
        PasswordService::new(&PasswordHashConfig {
            memory_cost: 8192,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_hash_and_verify_password() {
        let service = test_service();
        let hash = service.hash("Passw0rd!").await.expect("Failed to hash");

        assert!(service.verify("Passw0rd!", &hash).await.unwrap());
        assert!(!service.verify("WrongPassw0rd!", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_password_produces_different_hashes() {
        let service = test_service();

        let hash1 = service.hash("SamePassword123!").await.unwrap();
        let hash2 = service.hash("SamePassword123!").await.unwrap();

        assert_ne!(hash1, hash2);
        assert!(service.verify("SamePassword123!", &hash1).await.unwrap());
        assert!(service.verify("SamePassword123!", &hash2).await.unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid-hash-format");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_hash_embeds_configured_cost() {
        let params = Params::new(8192, 2, 1, None).unwrap();
        let hash = hash_password_with_params("TestPassword123!", params).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=8192"));
        assert!(hash.contains("t=2"));
        assert!(verify_password("TestPassword123!", &hash).unwrap());
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let result = PasswordService::new(&PasswordHashConfig {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::HashingFailed(_))));
    }

    #[test]
    fn test_password_strength_validation() {
        assert!(validate_password_strength("Passw0rd!").is_ok());
        assert!(validate_password_strength("abcdefg1?").is_ok());

        // Too short
        assert!(validate_password_strength("Pa0rd!").is_err());

        // No digit
        assert!(validate_password_strength("Password!").is_err());

        // No special character
        assert!(validate_password_strength("Password123").is_err());
    }
}
