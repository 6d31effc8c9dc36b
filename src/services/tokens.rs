// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed session tokens (HS256 JWTs).
//!
//! Access tokens carry the identity; refresh tokens carry only their expiry
//! and therefore cannot be used to reach resources. Expiry is checked
//! against the injected [`Clock`], not the library's wall-clock check, so
//! issuance and validation always agree on what "now" is.
//!
//! There is no revocation: a token stays valid until it expires, even after
//! a newer log-in has replaced it in storage.

use super::Clock;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims of an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (identity ID)
    pub sub: String,
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims of a refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub exp: i64,
}

/// A freshly issued token pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,

    /// Bad signature, bad encoding or missing claims.
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(signing_key: &[u8], validity: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            validity,
            clock,
        }
    }

    pub fn validity(&self) -> chrono::Duration {
        self.validity
    }

    /// Issue an access/refresh pair, both expiring `validity` from now.
    pub fn issue(&self, username: &str, identity_id: &str) -> Result<IssuedTokens, TokenError> {
        let now = self.clock.now();
        let expires_at = now + self.validity;

        let access = AccessClaims {
            sub: identity_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let refresh = RefreshClaims {
            exp: expires_at.timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        let refresh_token = encode(&header, &refresh, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Verify the signature, then the expiry.
    ///
    /// A token is accepted up to and including the second it expires.
    pub fn validate(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        if data.claims.exp < self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}
