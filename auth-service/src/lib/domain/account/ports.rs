use async_trait::async_trait;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::NewAccount;
use crate::domain::account::models::Principal;
use crate::domain::account::models::RegisterCommand;

/// Port for credential operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new account with a hashed password.
    ///
    /// # Arguments
    /// * `command` - Validated command containing name, email, password and profile
    ///
    /// # Returns
    /// Created account with its assigned id
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Password` - Password hashing failed
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Account, AccountError>;

    /// Check an email/password pair.
    ///
    /// # Returns
    /// The matching account
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password, indistinguishably
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AccountError>;

    /// Retrieve account by email.
    ///
    /// # Errors
    /// * `NotFound` - No account with this email
    /// * `DatabaseError` - Database operation failed
    async fn get_account_by_email(&self, email: &str) -> Result<Account, AccountError>;
}

/// Persistence operations for accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Retrieve account by email address.
    ///
    /// # Returns
    /// Optional account (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// Check whether an email is already registered.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn exists_by_email(&self, email: &str) -> Result<bool, AccountError>;

    /// Persist a new account and assign its id.
    ///
    /// # Returns
    /// Stored account with assigned id
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email uniqueness violated
    /// * `DatabaseError` - Database operation failed
    async fn save(&self, account: NewAccount) -> Result<Account, AccountError>;
}

/// Resolves the principal behind an authenticated email.
#[async_trait]
pub trait PrincipalLoader: Send + Sync + 'static {
    /// # Returns
    /// Principal, or None when no account has this email
    ///
    /// # Errors
    /// * `DatabaseError` - Lookup failed
    async fn load_principal(&self, email: &str) -> Result<Option<Principal>, AccountError>;
}
