use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let account = state
        .account_service
        .authenticate(&body.email, &body.password)
        .await
        .map_err(ApiError::from)?;

    let token = state
        .token_codec
        .issue(account.email.as_str(), account.id.as_i64())
        .map_err(|e| {
            tracing::error!(account_id = %account.id, error = %e, "Token issuance failed");
            ApiError::InternalServerError("Internal server error".to_string())
        })?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginResponseData {
            token,
            user_id: account.id.as_i64(),
            name: account.name.as_str().to_string(),
            email: account.email.as_str().to_string(),
        },
    ))
}

/// Absent fields deserialize as empty strings and fail like any other
/// wrong credential.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseData {
    pub token: String,
    pub user_id: i64,
    pub name: String,
    pub email: String,
}
