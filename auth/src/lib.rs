//! Authentication utilities library
//!
//! Provides the credential and token primitives used by the auth service and
//! by any service that has to accept its tokens:
//! - Password hashing (Argon2id)
//! - JWT issuance and validation (HS256, issuer/audience/expiry checks)
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::{TokenCodec, TokenConfig};
//!
//! let config = TokenConfig::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     "auth-service",
//!     "recipe-api",
//! )
//! .unwrap();
//! let codec = TokenCodec::new(config);
//!
//! let token = codec.issue("alice@example.com", 7).unwrap();
//! assert_eq!(codec.extract_subject_email(&token).unwrap(), "alice@example.com");
//! assert_eq!(codec.extract_user_id(&token).unwrap(), 7);
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::Audience;
pub use jwt::Claims;
pub use jwt::Clock;
pub use jwt::JwtError;
pub use jwt::ManualClock;
pub use jwt::SystemClock;
pub use jwt::TokenCodec;
pub use jwt::TokenConfig;
pub use password::PasswordError;
pub use password::PasswordHasher;
