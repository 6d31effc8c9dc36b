// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication middleware.

use crate::error::AppError;
use crate::services::AccessClaims;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated identity extracted from a validated access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity_id: String,
    pub claims: AccessClaims,
}

/// Pull the token out of an `Authorization` header value.
///
/// Accepts `Bearer <token>` and the older `Bearer: <token>` form.
fn bearer_token(value: &str) -> Option<&str> {
    let rest = value.strip_prefix("Bearer")?;
    let token = rest
        .strip_prefix(": ")
        .or_else(|| rest.strip_prefix(' '))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware that requires a valid access token.
///
/// No header at all is `Forbidden`; a header without the bearer prefix is
/// an `InvalidRequest`. Bad or expired tokens are `Forbidden`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Forbidden)?;

    let token = header_value
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| {
            AppError::InvalidRequest("authorization header must start with 'Bearer '".to_string())
        })?;

    let claims = state.tokens.validate(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::from(e)
    })?;

    tracing::debug!(
        identity_id = %claims.sub,
        username = %claims.username,
        "Authenticated request"
    );

    let auth_user = AuthUser {
        identity_id: claims.sub.clone(),
        claims,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_forms() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer: abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
        assert_eq!(bearer_token("Bearerabc"), None);
    }
}
