use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::errors::EmailError;
use crate::domain::account::errors::NameError;
use crate::domain::account::errors::PasswordPolicyError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountName;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::Password;
use crate::domain::account::models::RegisterCommand;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    state
        .account_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::CREATED, account.into()))
}

/// HTTP request body for registering an account (raw JSON)
///
/// Fields are optional here so that a missing one is reported with a
/// readable reason instead of a generic deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    #[serde(alias = "passwordHash")]
    password: Option<String>,
    age_group: Option<String>,
    diet_preference: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid name: {0}")]
    Name(#[from] NameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ParseRegisterRequestError> {
        let name = AccountName::new(required(self.name, "name")?)?;
        let email = EmailAddress::new(required(self.email, "email")?)?;
        let password = Password::new(required(self.password, "password")?)?;
        Ok(RegisterCommand::new(
            name,
            email,
            password,
            self.age_group,
            self.diet_preference,
        ))
    }
}

fn required(
    value: Option<String>,
    field: &'static str,
) -> Result<String, ParseRegisterRequestError> {
    value.ok_or(ParseRegisterRequestError::MissingField(field))
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponseData {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&Account> for RegisterResponseData {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.as_i64(),
            name: account.name.as_str().to_string(),
            email: account.email.as_str().to_string(),
        }
    }
}
