use std::sync::Arc;
use std::time::Duration;

use auth::TokenCodec;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::current_account::current_account;
use super::handlers::login::login;
use super::handlers::register::register;
use super::middleware::authenticate;
use super::middleware::RequestAuthenticator;
use crate::domain::account::ports::AccountServicePort;
use crate::domain::account::ports::PrincipalLoader;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub token_codec: Arc<TokenCodec>,
    pub request_authenticator: Arc<RequestAuthenticator>,
}

pub fn create_router<S>(account_service: Arc<S>, token_codec: Arc<TokenCodec>) -> Router
where
    S: AccountServicePort + PrincipalLoader,
{
    let request_authenticator = Arc::new(RequestAuthenticator::new(
        Arc::clone(&token_codec),
        Arc::clone(&account_service) as Arc<dyn PrincipalLoader>,
    ));

    let state = AppState {
        account_service,
        token_codec,
        request_authenticator,
    };

    let routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(current_account));

    // Headers are left out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    routes
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
