use std::fmt;
use std::str::FromStr;

use crate::domain::account::errors::EmailError;
use crate::domain::account::errors::NameError;
use crate::domain::account::errors::PasswordPolicyError;

/// Registered account.
///
/// `id` is assigned by the store; `id` and `email` never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: AccountName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub age_group: Option<String>,
    pub diet_preference: Option<String>,
}

/// Account awaiting its store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: AccountName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub age_group: Option<String>,
    pub diet_preference: Option<String>,
}

impl NewAccount {
    /// Attach the identifier the store assigned on insert.
    pub fn with_id(self, id: AccountId) -> Account {
        Account {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            age_group: self.age_group,
            diet_preference: self.diet_preference,
        }
    }
}

/// Account unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub i64);

impl AccountId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Trimmed, non-blank and at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountName(String);

impl AccountName {
    const MAX_LENGTH: usize = 100;

    /// Create a new valid name.
    ///
    /// # Errors
    /// * `Blank` - Name is empty or whitespace only
    /// * `TooLong` - Name longer than 100 characters
    pub fn new(name: String) -> Result<Self, NameError> {
        let name = name.trim();
        let length = name.chars().count();

        if length == 0 {
            Err(NameError::Blank)
        } else if length > Self::MAX_LENGTH {
            Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted at registration.
///
/// Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// # Errors
    /// * `Empty` - Password is the empty string
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        if password.is_empty() {
            return Err(PasswordPolicyError::Empty);
        }
        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Command to register a new account with validated fields.
#[derive(Debug)]
pub struct RegisterCommand {
    pub name: AccountName,
    pub email: EmailAddress,
    pub password: Password,
    pub age_group: Option<String>,
    pub diet_preference: Option<String>,
}

impl RegisterCommand {
    /// Construct a new registration command.
    ///
    /// Blank optional profile fields are dropped.
    pub fn new(
        name: AccountName,
        email: EmailAddress,
        password: Password,
        age_group: Option<String>,
        diet_preference: Option<String>,
    ) -> Self {
        Self {
            name,
            email,
            password,
            age_group: non_blank(age_group),
            diet_preference: non_blank(diet_preference),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Identity resolved for an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: AccountId,
    pub email: EmailAddress,
    pub name: AccountName,
    pub roles: Vec<String>,
}

impl Principal {
    pub const DEFAULT_ROLE: &'static str = "USER";

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<&Account> for Principal {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            roles: vec![Self::DEFAULT_ROLE.to_string()],
        }
    }
}
