use std::collections::HashMap;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Name of the custom claim carrying the numeric account identifier.
pub const USER_ID_CLAIM: &str = "userId";

/// `aud` claim as allowed by RFC 7519.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// JWT claims issued for an authenticated account.
///
/// Registered RFC 7519 claims are typed fields; custom claims such as
/// `userId` live in the flattened `extra` map. Fields are optional on the
/// way in so that a token lacking one claim can still be inspected, and the
/// accessors decide what is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (account email)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience, a single string or an array of strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Additional custom fields (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the claim set for an account.
    ///
    /// # Arguments
    /// * `email` - Account email, stored as `sub`
    /// * `user_id` - Numeric account identifier, stored as `userId`
    /// * `issued_at` - Issuance instant
    /// * `validity` - Lifetime added to `issued_at` to produce `exp`
    pub fn for_account(
        email: impl ToString,
        user_id: i64,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Self {
        let expiration = issued_at + validity;

        Self::new()
            .with_subject(email)
            .with_issued_at(issued_at.timestamp())
            .with_expiration(expiration.timestamp())
            .with_extra(USER_ID_CLAIM, user_id)
    }

    /// Set subject.
    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: impl ToString) -> Self {
        self.iss = Some(iss.to_string());
        self
    }

    /// Set audience.
    pub fn with_audience(mut self, aud: impl ToString) -> Self {
        self.aud = Some(Audience::Single(aud.to_string()));
        self
    }

    /// Add a custom field.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), json_value);
        }
        self
    }

    /// Subject email, if present.
    pub fn subject_email(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Numeric account identifier from the `userId` claim.
    ///
    /// Returns `None` when the claim is absent or is not an integer.
    pub fn user_id(&self) -> Option<i64> {
        self.extra.get(USER_ID_CLAIM).and_then(|v| v.as_i64())
    }

    /// Check if token is expired.
    ///
    /// A token is expired from the second named by `exp` onwards.
    /// Claims without `exp` are treated as expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(true, |exp| exp <= current_timestamp)
    }
}

impl Default for Claims {
    fn default() -> Self {
        Self {
            sub: None,
            exp: None,
            iat: None,
            iss: None,
            aud: None,
            extra: HashMap::new(),
        }
    }
}
