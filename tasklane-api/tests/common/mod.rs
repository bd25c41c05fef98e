//! Common test utilities for integration tests
//!
//! - Router over a fresh in-memory store
//! - Request helpers returning `(status, headers, json body)`
//! - Registration and login shortcuts
//! - Stores that fail or panic, for error-path tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tasklane_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasklane_shared::db::{
    memory::MemoryStore,
    store::{Store, StoreError, Transaction},
};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Configuration for tests: in-memory store, cheap password hashing
pub fn test_config() -> Config {
    test_config_with(&[])
}

/// Test configuration with extra variables layered on top
pub fn test_config_with(overrides: &[(&str, &str)]) -> Config {
    Config::from_lookup(|key| {
        if let Some((_, value)) = overrides.iter().find(|(name, _)| *name == key) {
            return Some(value.to_string());
        }
        let value = match key {
            "DATABASE_URL" => "memory://",
            "JWT_SECRET" => SECRET,
            "PASSWORD_HASH_MEMORY_KIB" => "1024",
            "PASSWORD_HASH_ITERATIONS" => "1",
            "PASSWORD_HASH_PARALLELISM" => "1",
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

/// Parsed response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Test context wrapping a router
pub struct TestContext {
    pub state: AppState,
    pub app: Router,
}

impl TestContext {
    /// Fresh app over an empty in-memory store
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self::with_config(store, test_config())
    }

    pub fn with_config(store: Arc<dyn Store>, config: Config) -> Self {
        let state = AppState::new(store, config);
        let app = build_router(state.clone());
        Self { state, app }
    }

    /// Sends a request; `body` is serialized as JSON when present
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send_request(builder.body(body).unwrap()).await
    }

    /// Sends a prebuilt request
    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Registers `username` with `<username>@x.com` / `pw123456`
    pub async fn register(&self, username: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@x.com", username),
                "password": "pw123456"
            })),
        )
        .await
    }

    /// Registers and logs in, returning the access token
    pub async fn signup(&self, username: &str) -> String {
        let registered = self.register(username).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        let login = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": "pw123456" })),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);

        login.body["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a task and returns its JSON view
    pub async fn create_task(&self, token: &str, body: Value) -> Value {
        let created = self
            .send(Method::POST, "/api/tasks", Some(token), Some(body))
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
        created.body["task"].clone()
    }
}

/// Store whose transactions can never be opened
pub struct UnavailableStore;

#[async_trait]
impl Store for UnavailableStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

/// Store that panics on use
pub struct PanickingStore;

#[async_trait]
impl Store for PanickingStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        panic!("store exploded");
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
