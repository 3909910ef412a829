//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory store and a recording mailer, and
//! offers request helpers plus a shortcut for getting a signed-in user.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use contacthub_api::app::{build_router, AppState};
use contacthub_api::config::Config;
use contacthub_shared::{mail::RecordingMailer, store::memory::MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub const PASSWORD: &str = "Passw0rd";

/// Test context containing the app and its backends
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub config: Config,
}

/// A signed-up and logged-in user
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::new())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        let config = Config::new("postgresql://unused", JWT_SECRET);
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(mailer);

        let state = AppState::new(store.clone(), mailer.clone(), config.clone());

        Self {
            app: build_router(state),
            store,
            mailer,
            config,
        }
    }

    /// Sends a request and returns the status and JSON body (Null when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Signs up `username` and logs in
    pub async fn signed_in_user(&self, username: &str) -> TestUser {
        let email = format!("{}@example.com", username);

        let (status, _) = self
            .post("/api/users/signup", None, signup_body(username, &email))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .post(
                "/api/users/login",
                None,
                json!({ "login": username, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            username: username.to_string(),
            email,
            access_token: body["tokens"]["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["tokens"]["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a contact for `user`, returning its id
    pub async fn create_contact(&self, user: &TestUser, first_name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/contacts",
                Some(&user.access_token),
                contact_body(first_name, "Babbage"),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        body["id"].as_str().unwrap().to_string()
    }

    /// Creates an address for a contact, returning its id
    pub async fn create_address(&self, user: &TestUser, contact_id: &str) -> String {
        let (status, body) = self
            .post(
                "/api/addresses",
                Some(&user.access_token),
                address_body(contact_id, "home"),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        body["id"].as_str().unwrap().to_string()
    }
}

pub fn signup_body(username: &str, email: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": email,
        "username": username,
        "password": PASSWORD,
    })
}

pub fn contact_body(first_name: &str, last_name: &str) -> Value {
    json!({
        "first_name": first_name,
        "last_name": last_name,
        "phone_number": "+44 20 7946 0000",
        "email": "charles@example.com",
    })
}

pub fn address_body(contact_id: &str, address_type: &str) -> Value {
    json!({
        "contact_id": contact_id,
        "address_type": address_type,
        "street": "1 Dorset Street",
        "city": "London",
        "state": "Greater London",
        "postal_code": "W1U 6QE",
    })
}
