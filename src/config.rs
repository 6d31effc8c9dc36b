// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; the resulting [`Config`] is moved
//! into the shared application state and never re-read.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which storage backend serves the identity, edge and location stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Google Cloud Firestore (or its emulator).
    Firestore,
    /// In-process maps; state is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Storage backend selected at startup
    pub storage_backend: StorageBackend,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Validity window of issued access and refresh tokens
    pub token_validity: chrono::Duration,
    /// Upper bound on the time spent serving one request
    pub request_timeout: Duration,
    /// Verbose logging
    pub debug: bool,
}

impl Config {
    pub const DEFAULT_TOKEN_VALIDITY_HOURS: i64 = 168;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Config for tests: in-memory storage and a fixed signing key.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            storage_backend: StorageBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            token_validity: chrono::Duration::hours(Self::DEFAULT_TOKEN_VALIDITY_HOURS),
            request_timeout: Duration::from_secs(Self::DEFAULT_REQUEST_TIMEOUT_SECS),
            debug: true,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let token_validity_hours: i64 =
            parse_var("TOKEN_VALIDITY_HOURS", Self::DEFAULT_TOKEN_VALIDITY_HOURS)?;
        if token_validity_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_VALIDITY_HOURS",
                value: token_validity_hours.to_string(),
            });
        }

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "STORAGE_BACKEND",
                value: raw,
            })?,
            Err(_) => StorageBackend::Firestore,
        };

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .trim()
            .as_bytes()
            .to_vec();
        if jwt_signing_key.is_empty() {
            return Err(ConfigError::Missing("JWT_SIGNING_KEY"));
        }

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage_backend,
            jwt_signing_key,
            token_validity: chrono::Duration::hours(token_validity_hours),
            request_timeout: Duration::from_secs(parse_var(
                "REQUEST_TIMEOUT_SECS",
                Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            debug: parse_var("APP_DEBUG", false)?,
        })
    }
}

/// Read an optional variable, falling back to `default` only when unset.
fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
