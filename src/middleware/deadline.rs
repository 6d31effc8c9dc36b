// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-request deadline.
//!
//! When the deadline passes the handler future is dropped, which cancels any
//! storage call still in flight, and the client gets a timeout error.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub async fn enforce_deadline(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    tokio::time::timeout(state.config.request_timeout, next.run(request))
        .await
        .map_err(|_| {
            tracing::warn!(
                path = %path,
                timeout_secs = state.config.request_timeout.as_secs(),
                "Request deadline exceeded, cancelling"
            );
            AppError::Timeout
        })
}
