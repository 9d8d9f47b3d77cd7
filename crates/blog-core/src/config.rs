//! Blog API configuration management
//!
//! Handles configuration from environment variables and TOML files.
//! Secrets have no usable defaults: `validate` rejects a configuration
//! without a signing secret or database URL.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token signing and password hashing
    pub auth: AuthConfig,

    /// Runtime environment mode
    pub environment: Environment,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply environment overrides
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values present in the environment (env takes precedence)
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT").or_else(|_| std::env::var("API_PORT")) {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                value: port,
            })?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(size) = std::env::var("DATABASE_POOL_SIZE") {
            self.database.pool_size = size.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DATABASE_POOL_SIZE".to_string(),
                value: size,
            })?;
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(expires_in) = std::env::var("JWT_EXPIRES_IN") {
            self.auth.token_lifetime_secs = parse_lifetime(&expires_in)?;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Ok(cost) = std::env::var("PASSWORD_HASH_COST") {
            self.auth.password_hash.time_cost =
                cost.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "PASSWORD_HASH_COST".to_string(),
                    value: cost,
                })?;
        }

        // Environment mode
        if let Ok(mode) = std::env::var("APP_ENV").or_else(|_| std::env::var("NODE_ENV")) {
            self.environment = mode.parse()?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Reject configurations that would run with missing secrets
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("DATABASE_URL".to_string()));
        }
        if self.auth.token_lifetime_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRES_IN".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS (empty means any origin)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Connection pool size
    pub pool_size: u32,

    /// Seconds to wait for a pooled connection before failing
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Token and password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub token_lifetime_secs: u64,

    /// Token issuer identifier
    pub issuer: String,

    /// Argon2 cost parameters
    pub password_hash: PasswordHashConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: 30 * 24 * 3600, // 30 days
            issuer: "blog-api".to_string(),
            password_hash: PasswordHashConfig::default(),
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,

    /// Iterations
    pub time_cost: u32,

    /// Lanes
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Runtime environment mode
///
/// Controls how much error detail reaches clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Parse a token lifetime such as `3600`, `90s`, `15m`, `12h` or `30d`
pub fn parse_lifetime(value: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "JWT_EXPIRES_IN".to_string(),
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let (digits, multiplier) = match trimmed.chars().last() {
        Some('s') => (&trimmed[..trimmed.len() - 1], 1),
        Some('m') => (&trimmed[..trimmed.len() - 1], 60),
        Some('h') => (&trimmed[..trimmed.len() - 1], 3600),
        Some('d') => (&trimmed[..trimmed.len() - 1], 86400),
        Some(c) if c.is_ascii_digit() => (trimmed, 1),
        _ => return Err(invalid()),
    };

    let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
    amount.checked_mul(multiplier).ok_or_else(invalid)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "test-secret".to_string();
        config.database.url = "postgres://localhost/blog".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.auth.token_lifetime_secs, 2_592_000);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let mut config = valid_config();
        config.auth.jwt_secret = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(key)) if key == "JWT_SECRET"
        ));
    }

    #[test]
    fn test_missing_database_url_is_rejected() {
        let mut config = valid_config();
        config.database.url.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(key)) if key == "DATABASE_URL"
        ));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!(
            "PRODUCTION".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_parse_lifetime() {
        assert_eq!(parse_lifetime("3600").unwrap(), 3600);
        assert_eq!(parse_lifetime("90s").unwrap(), 90);
        assert_eq!(parse_lifetime("15m").unwrap(), 900);
        assert_eq!(parse_lifetime("12h").unwrap(), 43_200);
        assert_eq!(parse_lifetime("30d").unwrap(), 2_592_000);
        assert!(parse_lifetime("").is_err());
        assert!(parse_lifetime("soon").is_err());
        assert!(parse_lifetime("5w").is_err());
    }

    #[test]
    fn test_toml_sections_are_optional() {
        let config: AppConfig = toml::from_str(
            r#"
            environment = "development"

            [auth]
            jwt_secret = "from-file"
            token_lifetime_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.auth.jwt_secret, "from-file");
        assert_eq!(config.auth.token_lifetime_secs, 60);
        assert_eq!(config.auth.issuer, "blog-api");
        assert_eq!(config.server.port, 5000);
    }
}
