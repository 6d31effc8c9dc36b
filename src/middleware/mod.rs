// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, deadlines, response headers).

pub mod auth;
pub mod deadline;
pub mod security;

pub use auth::require_auth;
pub use deadline::enforce_deadline;
