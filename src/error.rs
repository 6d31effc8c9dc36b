// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;
use crate::services::credentials::CredentialError;
use crate::services::tokens::TokenError;

/// Machine-readable error category returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Forbidden,
    Conflict,
    Internal,
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Credential mismatch or missing bearer token.
    #[error("forbidden")]
    Forbidden,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("request timed out")]
    Timeout,

    #[error("database error: {0}")]
    Database(String),

    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Forbidden | AppError::InvalidToken | AppError::TokenExpired => {
                ErrorKind::Forbidden
            }
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Timeout | AppError::Database(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden | AppError::InvalidToken | AppError::TokenExpired => {
                StatusCode::FORBIDDEN
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    kind: ErrorKind,
    message: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "internal error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "internal error".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            kind: self.kind(),
            message,
            code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken => AppError::Conflict(err.to_string()),
            StoreError::NotFound => AppError::NotFound(err.to_string()),
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::Malformed(_) => AppError::InvalidToken,
            TokenError::Signing(msg) => {
                AppError::Internal(anyhow::anyhow!("token signing failed: {}", msg))
            }
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Mismatch => AppError::Forbidden,
            CredentialError::Encoding(_) | CredentialError::CorruptHash(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_details_are_not_rendered() {
        let response = AppError::Database("connection reset by peer".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_token_errors_are_forbidden() {
        assert_eq!(AppError::from(TokenError::Expired).kind(), ErrorKind::Forbidden);
        assert_eq!(
            AppError::from(TokenError::Malformed("bad".into())).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            AppError::from(TokenError::Signing("bad key".into())).kind(),
            ErrorKind::Internal
        );
    }
}
