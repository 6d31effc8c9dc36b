// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes acting on the authenticated user.
//! The auth middleware is applied in routes/mod.rs for these routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::payloads::{FriendDetails, ObserveRequest, ProfileResponse, UpdateStatusRequest};
use crate::models::LocationUpdate;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/status", put(update_status))
        .route("/api/me/location", put(update_location))
        .route("/api/me/friends", get(get_friends))
        .route("/api/me/observe", post(observe).delete(unobserve))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    Ok(Json(state.session.profile(&user.identity_id).await?))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: JsonBody<UpdateStatusRequest>,
) -> Result<StatusCode> {
    let Json(request) = payload?;
    state.session.update_status(&user.identity_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: JsonBody<LocationUpdate>,
) -> Result<StatusCode> {
    let Json(update) = payload?;
    state
        .session
        .update_location(&user.identity_id, update)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mutual friends with their status and last location.
async fn get_friends(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FriendDetails>>> {
    Ok(Json(state.session.friends(&user.identity_id).await?))
}

/// Start observing a user. They must observe back before either sees the
/// other's location.
async fn observe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: JsonBody<ObserveRequest>,
) -> Result<StatusCode> {
    let Json(request) = payload?;
    state.session.observe(&user.identity_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stop observing a user. Not observing them already is fine.
async fn unobserve(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: JsonBody<ObserveRequest>,
) -> Result<StatusCode> {
    let Json(request) = payload?;
    state.session.unobserve(&user.identity_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}
