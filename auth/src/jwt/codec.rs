use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::USER_ID_CLAIM;
use super::clock::Clock;
use super::clock::SystemClock;
use super::config::TokenConfig;
use super::errors::JwtError;

/// Issues and parses signed bearer tokens for accounts.
///
/// Uses HS256 (HMAC with SHA-256). All state is fixed at construction, so a
/// single codec is shared by every request behind an `Arc`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    audience: String,
    validity: Duration,
    validate_issuer_audience: bool,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec that reads the wall clock.
    ///
    /// # Arguments
    /// * `config` - Signing key, issuer, audience and validity
    ///
    /// # Returns
    /// TokenCodec configured with HS256
    pub fn new(config: TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a codec driven by the given clock.
    pub fn with_clock(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            algorithm: Algorithm::HS256,
            issuer: config.issuer,
            audience: config.audience,
            validity: config.validity,
            validate_issuer_audience: config.validate_issuer_audience,
            clock,
        }
    }

    /// Issue a token for an account.
    ///
    /// # Arguments
    /// * `email` - Account email, becomes `sub`
    /// * `user_id` - Account identifier, becomes `userId`
    ///
    /// # Returns
    /// Compact JWS string
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, email: &str, user_id: i64) -> Result<String, JwtError> {
        let claims = Claims::for_account(email, user_id, self.clock.now(), self.validity)
            .with_issuer(&self.issuer)
            .with_audience(&self.audience);

        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a token.
    ///
    /// Checks the signature, requires `exp` and rejects it once the codec's
    /// clock reaches it. Issuer and audience are checked unless disabled in
    /// the [`TokenConfig`].
    ///
    /// # Errors
    /// * `TokenExpired` - `exp` is at or before now
    /// * `InvalidToken` - Bad signature, malformed token, missing `exp`,
    ///   or issuer/audience mismatch
    pub fn parse(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map_err(map_decode_error)?;

        let claims = token_data.claims;
        if claims.is_expired(self.clock.now().timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }

    // Expiry is checked against our own clock after decoding, not by
    // jsonwebtoken, so simulated time applies.
    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;

        if self.validate_issuer_audience {
            // jsonwebtoken only compares iss/aud when present.
            validation.set_required_spec_claims(&["exp", "iss", "aud"]);
            validation.set_issuer(&[&self.issuer]);
            validation.set_audience(&[&self.audience]);
        } else {
            validation.set_required_spec_claims(&["exp"]);
            validation.validate_aud = false;
        }

        validation
    }

    /// Subject email of a valid token.
    ///
    /// # Errors
    /// Same as [`TokenCodec::parse`], plus `InvalidToken` when `sub` is absent.
    pub fn extract_subject_email(&self, token: &str) -> Result<String, JwtError> {
        self.parse(token)?
            .sub
            .ok_or_else(|| JwtError::missing_claim("sub"))
    }

    /// Account identifier of a valid token.
    ///
    /// # Errors
    /// Same as [`TokenCodec::parse`], plus `InvalidToken` when `userId` is
    /// absent or not an integer.
    pub fn extract_user_id(&self, token: &str) -> Result<i64, JwtError> {
        self.parse(token)?
            .user_id()
            .ok_or_else(|| JwtError::missing_claim(USER_ID_CLAIM))
    }

    /// Whether the token parses. Error detail is discarded.
    pub fn is_valid(&self, token: &str) -> bool {
        self.parse(token).is_ok()
    }
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> JwtError {
    match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::InvalidIssuer => JwtError::InvalidToken("issuer mismatch".to_string()),
        ErrorKind::InvalidAudience => JwtError::InvalidToken("audience mismatch".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => JwtError::missing_claim(claim),
        _ => JwtError::InvalidToken(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::jwt::claims::Audience;
    use crate::jwt::clock::ManualClock;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";
    const OTHER_SECRET: &[u8] = b"another_secret_key_at_least_32_bytes!";

    fn config() -> TokenConfig {
        TokenConfig::new(SECRET, "auth-service", "recipe-api").unwrap()
    }

    fn codec_at(clock: &Arc<ManualClock>) -> TokenCodec {
        TokenCodec::with_clock(config(), clock.clone())
    }

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_issue_and_parse() {
        let codec = TokenCodec::new(config());

        let token = codec.issue("alice@example.com", 42).expect("Failed to issue token");
        assert_eq!(token.split('.').count(), 3);

        let claims = codec.parse(&token).expect("Failed to parse token");
        assert_eq!(claims.sub.as_deref(), Some("alice@example.com"));
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.iss.as_deref(), Some("auth-service"));
        assert_eq!(claims.aud, Some(Audience::Single("recipe-api".to_string())));
        assert_eq!(claims.exp.unwrap() - claims.iat.unwrap(), 24 * 60 * 60);
    }

    #[test]
    fn test_extractors_round_trip() {
        let codec = TokenCodec::new(config());

        for (email, user_id) in [("alice@example.com", 1), ("bob@example.org", i64::from(i32::MAX))] {
            let token = codec.issue(email, user_id).unwrap();
            assert_eq!(codec.extract_subject_email(&token).unwrap(), email);
            assert_eq!(codec.extract_user_id(&token).unwrap(), user_id);
            assert!(codec.is_valid(&token));
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = codec_at(&clock);
        let token = codec.issue("alice@example.com", 1).unwrap();

        clock.advance(Duration::hours(24) - Duration::seconds(1));
        assert!(codec.parse(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(codec.parse(&token).unwrap_err(), JwtError::TokenExpired);

        clock.advance(Duration::seconds(1));
        assert_eq!(codec.parse(&token).unwrap_err(), JwtError::TokenExpired);
        assert_eq!(
            codec.extract_subject_email(&token).unwrap_err(),
            JwtError::TokenExpired
        );
        assert!(!codec.is_valid(&token));
    }

    #[test]
    fn test_custom_validity() {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = TokenCodec::with_clock(
            config().with_validity(Duration::minutes(15)),
            clock.clone(),
        );
        let token = codec.issue("alice@example.com", 1).unwrap();

        clock.advance(Duration::minutes(15));
        assert_eq!(codec.parse(&token).unwrap_err(), JwtError::TokenExpired);
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let codec = TokenCodec::new(config());
        let other = TokenCodec::new(TokenConfig::new(OTHER_SECRET, "auth-service", "recipe-api").unwrap());

        let token = codec.issue("alice@example.com", 1).unwrap();

        assert!(matches!(
            other.parse(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_decode_invalid_token() {
        let codec = TokenCodec::new(config());

        for token in ["invalid.token.here", "", "not-a-jwt", "a.b"] {
            assert!(
                matches!(codec.parse(token), Err(JwtError::InvalidToken(_))),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let codec = TokenCodec::new(config());
        let token = codec.issue("alice@example.com", 1).unwrap();
        let forged = codec.issue("mallory@example.com", 2).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(matches!(
            codec.parse(&spliced),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_issuer_and_audience_mismatch() {
        let issuer_a = TokenCodec::new(config());
        let other_issuer = TokenCodec::new(TokenConfig::new(SECRET, "someone-else", "recipe-api").unwrap());
        let other_audience = TokenCodec::new(TokenConfig::new(SECRET, "auth-service", "billing-api").unwrap());

        let token = issuer_a.issue("alice@example.com", 1).unwrap();

        assert_eq!(
            other_issuer.parse(&token).unwrap_err(),
            JwtError::InvalidToken("issuer mismatch".to_string())
        );
        assert_eq!(
            other_audience.parse(&token).unwrap_err(),
            JwtError::InvalidToken("audience mismatch".to_string())
        );
    }

    #[test]
    fn test_issuer_audience_validation_disabled() {
        let issuer_a = TokenCodec::new(config());
        let lenient = TokenCodec::new(
            TokenConfig::new(SECRET, "someone-else", "billing-api")
                .unwrap()
                .with_issuer_audience_validation(false),
        );

        let token = issuer_a.issue("alice@example.com", 1).unwrap();
        let claims = lenient.parse(&token).expect("lenient codec should accept");
        assert_eq!(claims.iss.as_deref(), Some("auth-service"));
    }

    #[test]
    fn test_missing_user_id_claim() {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = codec_at(&clock);
        let claims = Claims::new()
            .with_subject("alice@example.com")
            .with_issuer("auth-service")
            .with_audience("recipe-api")
            .with_expiration(start().timestamp() + 60);
        let token = codec.encode(&claims).unwrap();

        assert_eq!(codec.extract_subject_email(&token).unwrap(), "alice@example.com");
        assert_eq!(
            codec.extract_user_id(&token).unwrap_err(),
            JwtError::InvalidToken("missing required claim: userId".to_string())
        );
    }

    #[test]
    fn test_non_numeric_user_id_claim() {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = codec_at(&clock);
        let claims = Claims::new()
            .with_subject("alice@example.com")
            .with_issuer("auth-service")
            .with_audience("recipe-api")
            .with_expiration(start().timestamp() + 60)
            .with_extra(USER_ID_CLAIM, "42");
        let token = codec.encode(&claims).unwrap();

        assert!(matches!(
            codec.extract_user_id(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_missing_subject_claim() {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = codec_at(&clock);
        let claims = Claims::new()
            .with_issuer("auth-service")
            .with_audience("recipe-api")
            .with_expiration(start().timestamp() + 60)
            .with_extra(USER_ID_CLAIM, 3);
        let token = codec.encode(&claims).unwrap();

        assert_eq!(codec.extract_user_id(&token).unwrap(), 3);
        assert!(matches!(
            codec.extract_subject_email(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_missing_expiration_is_rejected() {
        let codec = TokenCodec::new(config());
        let claims = Claims::new()
            .with_subject("alice@example.com")
            .with_issuer("auth-service")
            .with_audience("recipe-api")
            .with_extra(USER_ID_CLAIM, 1);
        let token = codec.encode(&claims).unwrap();

        assert_eq!(
            codec.parse(&token).unwrap_err(),
            JwtError::InvalidToken("missing required claim: exp".to_string())
        );
    }

    #[test]
    fn test_missing_issuer_and_audience_rejected_when_enforced() {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = codec_at(&clock);
        let claims = Claims::new()
            .with_subject("alice@example.com")
            .with_expiration(start().timestamp() + 60)
            .with_extra(USER_ID_CLAIM, 1);
        let token = codec.encode(&claims).unwrap();

        assert!(matches!(
            codec.parse(&token),
            Err(JwtError::InvalidToken(_))
        ));

        let without_audience = codec
            .encode(&claims.clone().with_issuer("auth-service"))
            .unwrap();
        assert_eq!(
            codec.parse(&without_audience).unwrap_err(),
            JwtError::InvalidToken("missing required claim: aud".to_string())
        );
    }

    #[test]
    fn test_missing_issuer_and_audience_accepted_when_lenient() {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = TokenCodec::with_clock(
            config().with_issuer_audience_validation(false),
            clock.clone(),
        );
        let claims = Claims::new()
            .with_subject("alice@example.com")
            .with_expiration(start().timestamp() + 60)
            .with_extra(USER_ID_CLAIM, 1);
        let token = codec.encode(&claims).unwrap();

        assert_eq!(codec.extract_subject_email(&token).unwrap(), "alice@example.com");
    }

    #[test]
    fn test_array_audience_accepted() {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = codec_at(&clock);
        let claims = Claims {
            aud: Some(Audience::Multiple(vec![
                "billing-api".to_string(),
                "recipe-api".to_string(),
            ])),
            ..Claims::new()
                .with_subject("alice@example.com")
                .with_issuer("auth-service")
                .with_expiration(start().timestamp() + 60)
                .with_extra(USER_ID_CLAIM, 5)
        };
        let token = codec.encode(&claims).unwrap();

        assert_eq!(codec.extract_user_id(&token).unwrap(), 5);
    }
}
