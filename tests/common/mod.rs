// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use where_is_everyone::config::Config;
use where_is_everyone::db::{FirestoreDb, MemoryDb, Storage};
use where_is_everyone::routes::create_router;
use where_is_everyone::services::{Clock, ManualClock};
use where_is_everyone::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Everything a router-level test needs to drive the API.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
}

/// Create a test app over in-memory storage and a manual clock.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ));
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Storage::from_backend(MemoryDb::new()),
        clock.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        clock,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Current manual-clock time as a Unix timestamp.
    pub fn now_timestamp(&self) -> i64 {
        self.clock.now().timestamp()
    }

    /// Send one request and return the status and the parsed JSON body
    /// (`Value::Null` for an empty body).
    pub async fn send(
        &self,
        method: &str,
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

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Sign up through the API and return the access token and identity ID.
    pub async fn sign_up(&self, name: &str) -> (String, String) {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/signup",
                None,
                Some(serde_json::json!({ "name": name, "password": "secret123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "sign-up failed: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["id"].as_str().unwrap().to_string(),
        )
    }

    pub async fn observe(&self, token: &str, username: &str) -> StatusCode {
        let (status, _) = self
            .send(
                "POST",
                "/api/me/observe",
                Some(token),
                Some(serde_json::json!({ "username": username })),
            )
            .await;
        status
    }
}
