use std::sync::Arc;

use auth::ManualClock;
use auth::TokenCodec;
use auth::TokenConfig;
use auth_service::domain::account::service::AccountService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryAccountRepository;
use chrono::TimeZone;
use chrono::Utc;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const TEST_ISSUER: &str = "auth-service";
pub const TEST_AUDIENCE: &str = "recipe-api";

/// Test application that spawns a real server
///
/// Accounts live in memory and token expiry is checked against a manual
/// clock the test can move forward.
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub clock: Arc<ManualClock>,
    pub token_codec: Arc<TokenCodec>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));
        let token_config = TokenConfig::new(TEST_SECRET, TEST_ISSUER, TEST_AUDIENCE)
            .expect("Failed to build token config");
        let token_codec = Arc::new(TokenCodec::with_clock(token_config, clock.clone()));

        let repository = Arc::new(InMemoryAccountRepository::new());
        let account_service = Arc::new(AccountService::new(repository));

        let router = create_router(account_service, Arc::clone(&token_codec));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            clock,
            token_codec,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register an account and assert it was created
    pub async fn register(&self, name: &str, email: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/auth/register")
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the issued token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }
}
