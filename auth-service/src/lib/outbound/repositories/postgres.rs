use async_trait::async_trait;
use sqlx::FromRow;
use sqlx::PgPool;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::AccountName;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::NewAccount;
use crate::domain::account::ports::AccountRepository;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    user_id: i64,
    name: String,
    email: String,
    password_hash: String,
    age_group: Option<String>,
    diet_preference: Option<String>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AccountError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId(row.user_id),
            name: AccountName::new(row.name)?,
            email: EmailAddress::new(row.email)?,
            password_hash: row.password_hash,
            age_group: row.age_group,
            diet_preference: row.diet_preference,
        })
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT user_id, name, email, password_hash, age_group, diet_preference
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AccountError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))
    }

    async fn save(&self, account: NewAccount) -> Result<Account, AccountError> {
        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (name, email, password_hash, age_group, diet_preference)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING user_id
            "#,
        )
        .bind(account.name.as_str())
        .bind(account.email.as_str())
        .bind(account.password_hash.as_str())
        .bind(account.age_group.as_deref())
        .bind(account.diet_preference.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
                {
                    return AccountError::EmailAlreadyExists(account.email.as_str().to_string());
                }
            }
            AccountError::DatabaseError(e.to_string())
        })?;

        Ok(account.with_id(AccountId(user_id)))
    }
}
