use thiserror::Error;

/// Error for AccountName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name is required")]
    Blank,

    #[error("Name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for registration password validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password is required")]
    Empty,
}

/// Top-level error for all account-related operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    // Domain-level errors
    #[error("Email already registered: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    NotFound(String),

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
