//! Common test utilities for API integration tests
//!
//! The router runs against the in-memory store and a mailer that records
//! what it was asked to send, so no database or SMTP server is needed.
//! Requests go through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use sellos_api::app::{build_router, AppState};
use sellos_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, MailConfig};
use sellos_shared::auth::jwt::issue_session_token;
use sellos_shared::mail::{MailError, Mailer, OutgoingEmail};
use sellos_shared::models::identity::{Identity, Role};
use sellos_shared::models::product::{CreateProduct, Product};
use sellos_shared::store::memory::MemoryStore;
use sellos_shared::store::Catalog;
use sellos_shared::workflow::accounts::{
    create_staff_member, register_customer, verify_email, NewStaffMember, RegisterCustomer,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const FRONTEND_URL: &str = "http://shop.test";
pub const PASSWORD: &str = "correct-horse-battery";

/// Mailer that keeps every message and can be told to fail
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Token at the end of the most recent link sent to `to`
    pub fn last_token_for(&self, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|email| email.to == to)
            .and_then(|email| email.link)
            .and_then(|link| {
                let token = link.rsplit(|c: char| c == '/' || c == '=').next()?.to_string();
                Some(token)
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::InvalidAddress(email.to));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub app: Router,
    pub config: Config,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
            json_logs: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        mail: MailConfig {
            frontend_url: FRONTEND_URL.to_string(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "no-reply@shop.test".to_string(),
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let config = test_config();

        let state = AppState::new(store.clone(), mailer.clone(), config.clone());
        let app = build_router(state);

        Self {
            store,
            mailer,
            app,
            config,
        }
    }

    /// Sends a request and returns status plus parsed JSON body (`Null` when empty)
    pub async fn call(
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
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, token, None).await
    }

    pub async fn staff(&self, role: Role, email: &str) -> (Identity, String) {
        let identity = create_staff_member(
            &*self.store,
            NewStaffMember {
                role,
                name: "Staff".to_string(),
                last_name: None,
                national_id: None,
                phone: None,
                email: email.to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await
        .unwrap();
        let token = token_for(&identity);
        (identity, token)
    }

    pub async fn admin(&self) -> (Identity, String) {
        self.staff(Role::Administrator, "admin@sellos-g.com").await
    }

    pub async fn employee(&self, email: &str) -> (Identity, String) {
        self.staff(Role::Employee, email).await
    }

    /// Verified customer with a session token
    pub async fn customer(&self, email: &str) -> (Identity, String) {
        let (identity, token) = register_customer(
            &*self.store,
            RegisterCustomer {
                name: "Cliente".to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap();
        let identity = verify_email(&*self.store, &token.token).await.unwrap();
        let session = token_for(&identity);
        (identity, session)
    }

    pub async fn product(&self, name: &str, base: Decimal, current: Option<Decimal>) -> Product {
        self.store
            .create_product(CreateProduct {
                name: name.to_string(),
                description: None,
                base_price: base,
                current_price: current,
                image_url: None,
                available: true,
            })
            .await
            .unwrap()
    }
}

pub fn token_for(identity: &Identity) -> String {
    issue_session_token(identity.id, identity.role, JWT_SECRET).unwrap()
}

/// Reads a JSON money value, which serializes as a string
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}
