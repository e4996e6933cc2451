#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use service_desk::app::{app, AppState};
use service_desk::auth::TokenIssuer;
use service_desk::config::AppConfig;
use service_desk::services::ServiceOptions;
use service_desk::testing::MemoryStore;

pub const SECRET: &str = "integration-test-secret";

/// A router over an in-memory store; each test gets its own.
pub struct TestApp {
    pub router: Router,
    pub mem: MemoryStore,
    pub tokens: TokenIssuer,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let mem = MemoryStore::new();
        let tokens = TokenIssuer::new(SECRET, chrono::Duration::hours(1), chrono::Duration::days(7))
            .expect("test secret is valid");
        let state = AppState::new(&mem.store(), tokens.clone(), ServiceOptions::default());
        let router = app(state, &AppConfig::development());
        Self { router, mem, tokens }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<Reply> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await.context("router request failed")?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("body is not JSON: {:?}", bytes))?
        };
        Ok(Reply { status, body })
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<Reply> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<Reply> {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Creates the default tariff, signs up one user and returns its access token.
    pub async fn user_session(&self, phone: &str) -> Result<String> {
        self.post("/pub/tariffs", None, json!({"name": "Basic"})).await?;
        let signup = self
            .post(
                "/pub/users/signup",
                None,
                json!({
                    "name": "Anna",
                    "last_name": "Petrova",
                    "email": format!("{}@example.com", phone.trim_start_matches('+')),
                    "phone": phone,
                    "password": "secret1"
                }),
            )
            .await?;
        anyhow::ensure!(signup.status == StatusCode::CREATED, "signup failed: {}", signup.body);

        let signin = self
            .post("/pub/users/signin", None, json!({"phone": phone, "password": "secret1"}))
            .await?;
        anyhow::ensure!(signin.status == StatusCode::OK, "signin failed: {}", signin.body);
        Ok(signin.body["access_token"].as_str().unwrap_or_default().to_string())
    }

    /// Creates a role, signs up one employee and returns (employee id, access token).
    pub async fn employee_session(&self, email: &str) -> Result<(i64, String)> {
        let role = self.post("/pub/roles", None, json!({"name": "operator"})).await?;
        let signup = self
            .post(
                "/pub/employee/signup",
                None,
                json!({
                    "name": "Ivan",
                    "last_name": "Sidorov",
                    "email": email,
                    "password": "secret1",
                    "role_id": role.body["id"]
                }),
            )
            .await?;
        anyhow::ensure!(signup.status == StatusCode::CREATED, "signup failed: {}", signup.body);

        let signin = self
            .post("/pub/employee/signin", None, json!({"email": email, "password": "secret1"}))
            .await?;
        anyhow::ensure!(signin.status == StatusCode::OK, "signin failed: {}", signin.body);
        Ok((
            signup.body["id"].as_i64().unwrap_or_default(),
            signin.body["access_token"].as_str().unwrap_or_default().to_string(),
        ))
    }
}
