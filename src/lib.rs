// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Where-is-everyone: share your position with the people you trust.
//!
//! This crate provides the backend API: sign-up and log-in with signed
//! session tokens, location and status updates, and the mutual
//! "observe" relationship that decides who may see whose position.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Storage;
use services::{Clock, SessionWorkflow, TokenService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tokens: TokenService,
    pub session: SessionWorkflow,
}

impl AppState {
    /// Wire the core services over a storage backend and a clock.
    ///
    /// The signing key is copied out of `config` exactly once here; nothing
    /// else reads it afterwards.
    pub fn new(config: Config, storage: Storage, clock: Arc<dyn Clock>) -> Self {
        let tokens = TokenService::new(&config.jwt_signing_key, config.token_validity, clock.clone());
        let session = SessionWorkflow::new(storage, tokens.clone(), clock);

        Self {
            config,
            tokens,
            session,
        }
    }
}
