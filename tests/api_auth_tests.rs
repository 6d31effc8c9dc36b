// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Protected routes accept requests with valid tokens
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn get_me_with_header(app: &common::TestApp, value: Option<&str>) -> StatusCode {
    let mut builder = Request::builder().method("GET").uri("/api/me");
    if let Some(value) = value {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    app.router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = common::create_test_app();
    let (status, body) = app.send("GET", "/api/me", None, None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");
}

#[tokio::test]
async fn test_protected_route_with_wrong_scheme() {
    let app = common::create_test_app();
    let (token, _) = app.sign_up("alice").await;

    assert_eq!(
        get_me_with_header(&app, Some(&format!("Token {}", token))).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        get_me_with_header(&app, Some(&token)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let app = common::create_test_app();
    let (status, body) = app
        .send("GET", "/api/me", Some("invalid.token.here"), None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let app = common::create_test_app();
    let (token, id) = app.sign_up("alice").await;

    let (status, body) = app.send("GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["username"], "alice");
    assert_eq!(body["status"], "");
    assert!(body["location"].is_null());
}

#[tokio::test]
async fn test_legacy_bearer_colon_form_accepted() {
    let app = common::create_test_app();
    let (token, _) = app.sign_up("alice").await;

    assert_eq!(
        get_me_with_header(&app, Some(&format!("Bearer: {}", token))).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_token_expires_after_validity_window() {
    let app = common::create_test_app();
    let (token, _) = app.sign_up("alice").await;

    app.clock.advance(chrono::Duration::hours(168));
    let (status, _) = app.send("GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(chrono::Duration::seconds(1));
    let (status, body) = app.send("GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "token expired");
}

#[tokio::test]
async fn test_refresh_token_cannot_authenticate() {
    let app = common::create_test_app();
    let (status, body) = app
        .send(
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({ "name": "alice", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let refresh = body["refresh_token"].as_str().unwrap();
    let (status, _) = app.send("GET", "/api/me", Some(refresh), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = common::create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/me/friends")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    // Should have CORS headers
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let app = common::create_test_app();
    let (status, body) = app.send("GET", "/health", None, None).await;

    // Health should be accessible without auth
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
