use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::NewAccount;
use crate::domain::account::ports::AccountRepository;

/// Process-local account store.
///
/// Used when no database is configured and by tests. Ids are sequential
/// from 1; email uniqueness is enforced under the write lock.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    last_id: i64,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.accounts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        Ok(self.state.read().await.accounts.get(email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AccountError> {
        Ok(self.state.read().await.accounts.contains_key(email))
    }

    async fn save(&self, account: NewAccount) -> Result<Account, AccountError> {
        let mut state = self.state.write().await;

        let email = account.email.as_str().to_string();
        if state.accounts.contains_key(&email) {
            return Err(AccountError::EmailAlreadyExists(email));
        }

        state.last_id += 1;
        let account = account.with_id(AccountId(state.last_id));
        state.accounts.insert(email, account.clone());

        Ok(account)
    }
}
