//! Integration tests for Bazaar.
//!
//! The tests drive the real storefront router in process with
//! `tower::ServiceExt::oneshot`: in-memory stores stand in for `PostgreSQL`
//! and `tower_sessions::MemoryStore` holds sessions. [`TestApp`] carries the
//! session cookie between requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::db::MemoryStore;
use bazaar_storefront::middleware::create_session_layer;
use bazaar_storefront::seed::{SeedData, seed};
use bazaar_storefront::state::AppState;

/// The demo catalog shipped with the CLI.
pub const DEMO_FIXTURE: &str = include_str!("../../cli/fixtures/seed.yaml");

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// An in-process storefront with one buyer session.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    cookie: Mutex<Option<String>>,
}

impl TestApp {
    /// Storefront with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Storefront with adjusted configuration.
    #[must_use]
    pub fn with_config(adjust: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let mut config = StorefrontConfig::new(SecretString::from("postgres://unused/test"));
        adjust(&mut config);

        let store = Arc::new(MemoryStore::new());
        let sessions = create_session_layer(tower_sessions::MemoryStore::default(), &config);
        let state = AppState::in_memory(config, Arc::clone(&store));

        Self {
            router: bazaar_storefront::app(state, sessions),
            store,
            cookie: Mutex::new(None),
        }
    }

    /// Storefront with the demo catalog loaded.
    pub async fn seeded() -> Self {
        Self::seeded_with_config(|_| {}).await
    }

    /// Storefront with adjusted configuration and the demo catalog loaded.
    pub async fn seeded_with_config(adjust: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let app = Self::with_config(adjust);
        let data = SeedData::from_yaml(DEMO_FIXTURE).expect("demo fixture parses");
        seed(app.store.as_ref(), data)
            .await
            .expect("demo fixture loads");
        app
    }

    /// Forget the session cookie (a different buyer).
    pub fn new_session(&self) {
        *self.cookie.lock().expect("cookie lock") = None;
    }

    /// Send a request, carrying and updating the session cookie.
    pub async fn request(&self, method: Method, uri: &str, body: Option<&Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(cookie) = self.cookie.lock().expect("cookie lock").clone() {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().to_string();
            *self.cookie.lock().expect("cookie lock") = Some(pair);
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Id of the seeded shopkeeper with the given phone.
    pub async fn shopkeeper_id(&self, phone: &str) -> String {
        let response = self
            .request(
                Method::POST,
                &format!("/shopkeepers/by-phone?phone={phone}"),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["id"]
            .as_str()
            .expect("shopkeeper id")
            .to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
