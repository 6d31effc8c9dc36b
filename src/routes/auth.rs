// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up and log-in routes.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use std::sync::Arc;

use crate::error::Result;
use crate::models::payloads::{AuthResponse, LogInRequest, SignUpRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/login", post(log_in))
}

/// Create a new user and return its first token pair.
///
/// 409 when the username is taken.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(request) = payload?;
    Ok(Json(state.session.sign_up(request).await?))
}

/// Log in with username and password.
///
/// 404 for an unknown username, 403 for a wrong password.
async fn log_in(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LogInRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(request) = payload?;
    Ok(Json(state.session.log_in(request).await?))
}
