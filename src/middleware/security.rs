// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response hardening headers.
//!
//! Responses carry bearer tokens and positions, so nothing may be cached
//! by intermediaries or sniffed into another content type.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

pub async fn add_security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    response
}
