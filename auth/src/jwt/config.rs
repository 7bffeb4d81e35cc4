use std::fmt;

use chrono::Duration;

use super::errors::JwtError;

/// Immutable settings for a [`TokenCodec`](super::TokenCodec).
///
/// Built once at startup and moved into the codec. The secret is never
/// exposed through `Debug`.
#[derive(Clone)]
pub struct TokenConfig {
    pub(crate) secret: Vec<u8>,
    pub(crate) issuer: String,
    pub(crate) audience: String,
    pub(crate) validity: Duration,
    pub(crate) validate_issuer_audience: bool,
}

impl TokenConfig {
    /// Minimum HMAC-SHA256 key length in bytes.
    pub const MIN_SECRET_LEN: usize = 32;

    /// Default token lifetime.
    pub const DEFAULT_VALIDITY_HOURS: i64 = 24;

    /// Create token settings with the default 24 hour validity and
    /// issuer/audience validation enabled.
    ///
    /// # Arguments
    /// * `secret` - HMAC signing key, at least 32 bytes
    /// * `issuer` - Value written to and expected in `iss`
    /// * `audience` - Value written to and expected in `aud`
    ///
    /// # Errors
    /// * `WeakSecret` - Secret shorter than 256 bits
    pub fn new(
        secret: impl AsRef<[u8]>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, JwtError> {
        let secret = secret.as_ref();
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(JwtError::WeakSecret {
                min: Self::MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }

        Ok(Self {
            secret: secret.to_vec(),
            issuer: issuer.into(),
            audience: audience.into(),
            validity: Duration::hours(Self::DEFAULT_VALIDITY_HOURS),
            validate_issuer_audience: true,
        })
    }

    /// Override the token lifetime.
    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Enable or disable rejecting tokens whose `iss`/`aud` differ from ours.
    pub fn with_issuer_audience_validation(mut self, enabled: bool) -> Self {
        self.validate_issuer_audience = enabled;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn validates_issuer_audience(&self) -> bool {
        self.validate_issuer_audience
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("validity", &self.validity)
            .field("validate_issuer_audience", &self.validate_issuer_audience)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_defaults() {
        let config = TokenConfig::new(SECRET, "auth-service", "recipe-api").unwrap();

        assert_eq!(config.issuer(), "auth-service");
        assert_eq!(config.audience(), "recipe-api");
        assert_eq!(config.validity(), Duration::hours(24));
        assert!(config.validates_issuer_audience());
    }

    #[test]
    fn test_rejects_short_secret() {
        let result = TokenConfig::new("too-short", "iss", "aud");
        assert_eq!(
            result.unwrap_err(),
            JwtError::WeakSecret { min: 32, actual: 9 }
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = TokenConfig::new(SECRET, "iss", "aud").unwrap();
        let rendered = format!("{:?}", config);

        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("test_secret_key"));
    }
}
