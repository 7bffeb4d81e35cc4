use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

/// Identity of the caller, as established by the request authenticator.
pub async fn current_account(
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<ApiSuccess<CurrentAccountData>, ApiError> {
    let Some(Extension(user)) = user else {
        return Err(ApiError::Unauthorized("Authentication required".to_string()));
    };

    Ok(ApiSuccess::new(StatusCode::OK, (&user).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAccountData {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
}

impl From<&AuthenticatedUser> for CurrentAccountData {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            user_id: user.principal.account_id.as_i64(),
            email: user.principal.email.as_str().to_string(),
            name: user.principal.name.as_str().to_string(),
            roles: user.principal.roles.clone(),
        }
    }
}
