use std::env;
use std::fmt;

use auth::JwtError;
use auth::TokenConfig;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; accounts are kept in memory when absent.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: i64,
    #[serde(default = "default_validate_issuer_audience")]
    pub validate_issuer_audience: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtConfigError {
    #[error("jwt.expiration_hours must be a positive number of hours, got {0}")]
    InvalidExpiration(i64),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl JwtConfig {
    /// Build the immutable token settings handed to the codec.
    ///
    /// # Errors
    /// * `InvalidExpiration` - Zero, negative or out of range `expiration_hours`
    /// * `Token(WeakSecret)` - Secret shorter than 32 bytes
    pub fn token_config(&self) -> Result<TokenConfig, JwtConfigError> {
        let validity = Some(self.expiration_hours)
            .filter(|hours| *hours > 0)
            .and_then(chrono::Duration::try_hours)
            .ok_or(JwtConfigError::InvalidExpiration(self.expiration_hours))?;

        Ok(
            TokenConfig::new(self.secret.as_bytes(), &self.issuer, &self.audience)?
                .with_validity(validity)
                .with_issuer_audience_validation(self.validate_issuer_audience),
        )
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_hours", &self.expiration_hours)
            .field("validate_issuer_audience", &self.validate_issuer_audience)
            .finish()
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_expiration_hours() -> i64 {
    TokenConfig::DEFAULT_VALIDITY_HOURS
}

fn default_validate_issuer_audience() -> bool {
    true
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}
