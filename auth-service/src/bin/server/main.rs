use std::sync::Arc;

use auth::TokenCodec;
use auth_service::config::Config;
use auth_service::domain::account::service::AccountService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryAccountRepository;
use auth_service::outbound::repositories::PostgresAccountRepository;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        persistent = config.database.url.is_some(),
        http_port = config.server.http_port,
        jwt_issuer = %config.jwt.issuer,
        jwt_audience = %config.jwt.audience,
        jwt_expiration_hours = config.jwt.expiration_hours,
        "Configuration loaded"
    );

    let token_codec = Arc::new(TokenCodec::new(config.jwt.token_config()?));

    let http_application = build_application(&config, token_codec).await?;

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited");

    Ok(())
}

async fn build_application(
    config: &Config,
    token_codec: Arc<TokenCodec>,
) -> Result<Router, anyhow::Error> {
    let Some(database_url) = config.database.url.as_deref() else {
        tracing::warn!("No database configured, accounts are kept in memory");
        let repository = Arc::new(InMemoryAccountRepository::new());
        let account_service = Arc::new(AccountService::new(repository));
        return Ok(create_router(account_service, token_codec));
    };

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(database_url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let repository = Arc::new(PostgresAccountRepository::new(pg_pool));
    let account_service = Arc::new(AccountService::new(repository));

    Ok(create_router(account_service, token_codec))
}
