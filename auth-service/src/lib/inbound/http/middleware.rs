use std::sync::Arc;

use auth::JwtError;
use auth::TokenCodec;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::account::models::Principal;
use crate::domain::account::ports::PrincipalLoader;
use crate::inbound::http::router::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Extension type carrying the principal resolved for this request.
///
/// Present only when the request carried a valid bearer token for an
/// existing account. Lives as long as the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub principal: Principal,
}

/// Result of running the request authenticator on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A new identity was attached.
    Authenticated(AuthenticatedUser),
    /// An identity was already attached and was left untouched.
    AlreadyAuthenticated,
    /// No identity attached; the request continues anonymously.
    Anonymous(AnonymousReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnonymousReason {
    /// No `Authorization: Bearer <token>` header.
    MissingToken,
    /// Token failed validation (invalid or expired).
    TokenRejected(JwtError),
    /// Token is valid but names an account that no longer exists.
    UnknownAccount,
    /// Principal lookup failed.
    LookupFailed,
}

/// Per-request gate deriving an identity from a bearer token.
///
/// Never rejects a request: failures leave it anonymous and the decision to
/// refuse anonymous callers is taken by the handlers.
pub struct RequestAuthenticator {
    token_codec: Arc<TokenCodec>,
    principal_loader: Arc<dyn PrincipalLoader>,
}

impl RequestAuthenticator {
    pub fn new(token_codec: Arc<TokenCodec>, principal_loader: Arc<dyn PrincipalLoader>) -> Self {
        Self {
            token_codec,
            principal_loader,
        }
    }

    /// Resolve and attach the caller's identity, first one wins.
    pub async fn authenticate<B>(&self, req: &mut http::Request<B>) -> AuthOutcome {
        if req.extensions().get::<AuthenticatedUser>().is_some() {
            return AuthOutcome::AlreadyAuthenticated;
        }

        let Some(token) = bearer_token(req.headers()).map(str::to_string) else {
            return AuthOutcome::Anonymous(AnonymousReason::MissingToken);
        };

        let email = match self.token_codec.extract_subject_email(&token) {
            Ok(email) => email,
            Err(e) => return AuthOutcome::Anonymous(AnonymousReason::TokenRejected(e)),
        };

        let principal = match self.principal_loader.load_principal(&email).await {
            Ok(Some(principal)) => principal,
            Ok(None) => return AuthOutcome::Anonymous(AnonymousReason::UnknownAccount),
            Err(e) => {
                tracing::warn!(error = %e, "Principal lookup failed, continuing anonymously");
                return AuthOutcome::Anonymous(AnonymousReason::LookupFailed);
            }
        };

        let user = AuthenticatedUser { principal };
        req.extensions_mut().insert(user.clone());

        AuthOutcome::Authenticated(user)
    }
}

/// Middleware that attaches an [`AuthenticatedUser`] when the request carries
/// a valid bearer token, then always runs the rest of the stack.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match state.request_authenticator.authenticate(&mut req).await {
        AuthOutcome::Authenticated(user) => {
            tracing::debug!(account_id = %user.principal.account_id, "Request authenticated");
        }
        AuthOutcome::AlreadyAuthenticated => {}
        AuthOutcome::Anonymous(AnonymousReason::MissingToken) => {}
        AuthOutcome::Anonymous(reason) => {
            tracing::debug!(reason = ?reason, "Bearer token not accepted");
        }
    }

    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
