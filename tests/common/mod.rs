#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use blog_api_rust::auth::RequestContext;
use blog_api_rust::config::AppConfig;
use blog_api_rust::database::models::User;
use blog_api_rust::database::{DatabaseManager, MemoryStore, PgStore, ResourceStore};
use blog_api_rust::graphql::inputs::CreateUserInput;
use blog_api_rust::services::MutationService;
use blog_api_rust::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "red12345";

/// An in-process server over a store
pub struct TestApp {
    pub config: AppConfig,
    pub state: AppState,
    pub store: Arc<dyn ResourceStore>,
}

fn test_config(database_url: Option<String>) -> AppConfig {
    AppConfig::from_vars(|key| match key {
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        "DATABASE_URL" => database_url.clone(),
        // Cheapest bcrypt work factor keeps the suite fast
        "SECURITY_BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test configuration")
}

impl TestApp {
    /// Fresh in-memory store
    pub fn new() -> Self {
        Self::with_store(test_config(None), Arc::new(MemoryStore::new()))
    }

    /// Migrated Postgres store at `DATABASE_URL` (`.env` is honoured), or `None` when unset
    pub async fn postgres() -> Result<Option<Self>> {
        dotenvy::dotenv().ok();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres tests");
            return Ok(None);
        };

        let config = test_config(Some(url));
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to DATABASE_URL")?;
        DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;

        Ok(Some(Self::with_store(config, Arc::new(PgStore::new(pool)))))
    }

    fn with_store(config: AppConfig, store: Arc<dyn ResourceStore>) -> Self {
        let state = AppState::new(&config, store.clone());
        Self { config, state, store }
    }

    pub fn service(&self) -> &MutationService {
        &self.state.service
    }

    pub fn router(&self) -> Router {
        app(&self.config, self.state.clone())
    }

    /// Sign up `name` as `<name>@example.com` and return the user with an authenticated context
    pub async fn signup(&self, name: &str) -> Result<(User, RequestContext)> {
        let payload = self
            .service()
            .create_user(CreateUserInput {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .context("signup failed")?;
        Ok((payload.user, RequestContext::bearer(&payload.token)))
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        let request = Request::builder().method("GET").uri(uri).body(Body::empty())?;
        self.send(request).await
    }

    /// POST a GraphQL document, optionally as the holder of `token`
    pub async fn graphql(&self, query: &str, variables: Value, token: Option<&str>) -> Result<Value> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = json!({ "query": query, "variables": variables });
        let (status, json) = self.send(builder.body(Body::from(body.to_string()))?).await?;
        anyhow::ensure!(status == StatusCode::OK, "unexpected status {}: {}", status, json);
        Ok(json)
    }

    async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = serde_json::from_slice(&bytes).with_context(|| {
            format!("response was not JSON: {}", String::from_utf8_lossy(&bytes))
        })?;
        Ok((status, json))
    }
}

/// `extensions.code` of the first GraphQL error, if any
pub fn error_code(response: &Value) -> Option<&str> {
    response["errors"][0]["extensions"]["code"].as_str()
}

pub fn error_message(response: &Value) -> Option<&str> {
    response["errors"][0]["message"].as_str()
}
