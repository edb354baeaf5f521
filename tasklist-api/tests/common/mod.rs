//! Common test utilities for integration tests
//!
//! Every `TestContext` gets its own router over fresh in-memory stores, so
//! tests never share users or tasks.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tasklist_api::app::{build_router, AppState};
use tasklist_api::config::{ApiConfig, Config, JwtConfig};
use tasklist_shared::db::{pool::DatabaseConfig, store::Stores};
use tower::Service as _;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub stores: Stores,
    pub config: Config,
}

/// Status and parsed JSON body (Null when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestContext {
    /// Creates a new test context backed by empty in-memory stores
    pub fn new() -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig::memory(),
            jwt: JwtConfig {
                secret: TEST_SECRET.to_string(),
            },
        };

        let stores = Stores::memory();
        let app = build_router(AppState::new(stores.clone(), config.clone()));

        Self {
            app,
            stores,
            config,
        }
    }

    /// Sends a request; `auth` is the raw `Authorization` header value
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "Expected JSON body, got {}: {}",
                    status,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        TestResponse { status, body }
    }

    /// Sends a request authenticated with `Token <token>`
    pub async fn send_as(
        &self,
        token: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let auth = format!("Token {}", token);
        self.send(method, uri, Some(&auth), body).await
    }

    /// Registers a user and returns their token
    pub async fn register(&self, username: &str, email: &str, password: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({
                    "username": username,
                    "email": email,
                    "password": password,
                })),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["user"]["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    /// Creates a task for the owner of `token` and returns its JSON
    pub async fn create_task(&self, token: &str, username: &str, title: &str, deadline: &str) -> Value {
        let response = self
            .send_as(
                token,
                Method::POST,
                "/tasks",
                Some(json!({
                    "title": title,
                    "content": "c",
                    "deadline": deadline,
                    "username": username,
                })),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}
