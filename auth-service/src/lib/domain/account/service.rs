use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::NewAccount;
use crate::domain::account::models::Password;
use crate::domain::account::models::Principal;
use crate::domain::account::models::RegisterCommand;
use crate::domain::account::ports::AccountRepository;
use crate::domain::account::ports::AccountServicePort;
use crate::domain::account::ports::PrincipalLoader;

static DUMMY_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

/// Argon2 hash checked when the email is unknown, so that both login
/// failures cost one verification.
fn dummy_password_hash(hasher: &auth::PasswordHasher) -> &'static str {
    DUMMY_PASSWORD_HASH.get_or_init(|| hasher.hash("no-such-account").unwrap_or_default())
}

/// Domain service implementation for account credentials.
///
/// Concrete implementation of AccountServicePort with dependency injection.
/// Argon2 work runs on the blocking pool so it never stalls the runtime.
pub struct AccountService<AR>
where
    AR: AccountRepository,
{
    repository: Arc<AR>,
    password_hasher: auth::PasswordHasher,
}

impl<AR> AccountService<AR>
where
    AR: AccountRepository,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Account persistence implementation
    pub fn new(repository: Arc<AR>) -> Self {
        Self {
            repository,
            password_hasher: auth::PasswordHasher::new(),
        }
    }

    async fn hash_password(&self, password: Password) -> Result<String, AccountError> {
        let hasher = self.password_hasher;

        tokio::task::spawn_blocking(move || hasher.hash(password.expose()))
            .await
            .map_err(|e| AccountError::Unknown(format!("Hashing task failed: {}", e)))?
            .map_err(AccountError::from)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AccountError> {
        let hasher = self.password_hasher;
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AccountError::Unknown(format!("Verification task failed: {}", e)))
    }

    async fn verify_unknown_account(&self, password: &str) -> Result<(), AccountError> {
        let hasher = self.password_hasher;
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            hasher.verify(&password, dummy_password_hash(&hasher))
        })
        .await
        .map(|_| ())
        .map_err(|e| AccountError::Unknown(format!("Verification task failed: {}", e)))
    }
}

#[async_trait]
impl<AR> AccountServicePort for AccountService<AR>
where
    AR: AccountRepository,
{
    async fn register(&self, command: RegisterCommand) -> Result<Account, AccountError> {
        // Fast path only; the store's unique constraint is authoritative.
        if self
            .repository
            .exists_by_email(command.email.as_str())
            .await?
        {
            tracing::debug!("Registration rejected: email already registered");
            return Err(AccountError::EmailAlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        let password_hash = self.hash_password(command.password).await.map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed during registration");
            e
        })?;

        let account = NewAccount {
            name: command.name,
            email: command.email,
            password_hash,
            age_group: command.age_group,
            diet_preference: command.diet_preference,
        };

        let created_account = self.repository.save(account).await?;
        tracing::info!(account_id = %created_account.id, "Account registered");

        Ok(created_account)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let Some(account) = self.repository.find_by_email(email).await? else {
            self.verify_unknown_account(password).await?;
            tracing::debug!("Login rejected: unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        if !self.verify_password(password, &account.password_hash).await? {
            tracing::warn!(account_id = %account.id, "Login rejected: password mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        tracing::info!(account_id = %account.id, "Account authenticated");
        Ok(account)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Account, AccountError> {
        self.repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| AccountError::NotFound(email.to_string()))
    }
}

#[async_trait]
impl<AR> PrincipalLoader for AccountService<AR>
where
    AR: AccountRepository,
{
    async fn load_principal(&self, email: &str) -> Result<Option<Principal>, AccountError> {
        match self.get_account_by_email(email).await {
            Ok(account) => Ok(Some(Principal::from(&account))),
            Err(AccountError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
