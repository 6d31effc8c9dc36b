// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use where_is_everyone::db::StoreError;
use where_is_everyone::error::{AppError, ErrorKind};

async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_store_errors_map_to_kinds() {
    assert_eq!(
        AppError::from(StoreError::UsernameTaken).kind(),
        ErrorKind::Conflict
    );
    assert_eq!(AppError::from(StoreError::NotFound).kind(), ErrorKind::NotFound);
    assert_eq!(
        AppError::from(StoreError::Backend("unavailable".into())).kind(),
        ErrorKind::Internal
    );
}

#[test]
fn test_timeout_is_internal_gateway_timeout() {
    assert_eq!(AppError::Timeout.kind(), ErrorKind::Internal);
    assert_eq!(AppError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_backend_details_not_leaked() {
    let (status, body) =
        body_of(StoreError::Backend("grpc: connection refused to 10.0.0.7".into()).into()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "internal");
    assert_eq!(body["message"], "internal error");
    assert_eq!(body["code"], 500);
}

#[tokio::test]
async fn test_conflict_body() {
    let (status, body) = body_of(StoreError::UsernameTaken.into()).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
    assert_eq!(body["message"], "conflict: username is already in use");
}
