//! Common test helpers for integration tests.
//!
//! Builds a router over an in-memory repository, issues tokens with chosen
//! scopes and drives requests through `tower::ServiceExt::oneshot`.
//!
//! # Note
//!
//! `#![allow(dead_code)]` is needed because every integration test file is
//! compiled as its own crate and uses a different subset of these helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderName, Method, Request, Response, StatusCode, header};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use todo_api::api::{AppState, create_router};
use todo_api::domain::ScopeSet;
use todo_api::infrastructure::{AppConfig, InMemoryTodoRepository};

pub const SECRET: &str = "integration-test-secret";
pub const BASE_URL: &str = "http://localhost:3000";

// =============================================================================
// App Creation Helpers
// =============================================================================

/// Router plus the state it was built from.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Issues a token carrying the given space separated scopes.
    pub fn token(&self, scopes: &str) -> String {
        self.state
            .tokens
            .issue("test-user", &ScopeSet::from_delimited(scopes), Duration::minutes(5))
            .unwrap()
    }

    /// Sends a request and returns the raw response.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::with_secret(SECRET).with_base_url(BASE_URL)
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_config(test_config())
}

pub fn create_test_app_with_config(config: AppConfig) -> TestApp {
    let state = AppState::new(Arc::new(InMemoryTodoRepository::new()), config);
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Builds a request with an optional bearer token, extra headers and an
/// optional JSON body.
pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    headers: &[(HeaderName, &str)],
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    for (name, value) in headers {
        builder = builder.header(name.clone(), *value);
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn header_value(response: &Response<Body>, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .map(|value| value.to_str().unwrap().to_string())
}

/// A todo as seen by a client right after a write.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub uid: String,
    pub etag: String,
    pub last_modified: String,
    pub data: Value,
}

impl Snapshot {
    pub fn path(&self) -> String {
        format!("/todos/{}", self.uid)
    }
}

/// Reads validators and `data` from a 200/201 todo response.
pub async fn snapshot(response: Response<Body>) -> Snapshot {
    assert!(
        matches!(response.status(), StatusCode::OK | StatusCode::CREATED),
        "unexpected status {}",
        response.status()
    );
    let etag = header_value(&response, header::ETAG).unwrap();
    let last_modified = header_value(&response, header::LAST_MODIFIED).unwrap();
    let body = body_json(response).await;
    let data = body["data"].clone();

    Snapshot {
        uid: data["uid"].as_str().unwrap().to_string(),
        etag,
        last_modified,
        data,
    }
}

/// Creates a todo through the API with a `todo.all` token.
pub async fn create_todo(app: &TestApp, body: Value) -> Snapshot {
    let token = app.token("todo.all");
    let response = app
        .send(request(Method::POST, "/todos", Some(&token), &[], Some(body)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    snapshot(response).await
}
