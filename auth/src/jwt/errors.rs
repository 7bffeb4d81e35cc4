use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is invalid: {0}")]
    InvalidToken(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Signing secret too short: minimum {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },
}

impl JwtError {
    pub(crate) fn missing_claim(name: &str) -> Self {
        JwtError::InvalidToken(format!("missing required claim: {}", name))
    }
}
