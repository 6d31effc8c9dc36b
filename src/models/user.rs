// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Identity model for storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered user stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Server-generated opaque ID (also used as document ID)
    pub id: String,
    /// Unique, case-sensitive login name
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Contact address (optional, not verified)
    #[serde(default)]
    pub email: Option<String>,
    /// Free-text status shown to friends
    #[serde(default)]
    pub status: String,
    /// When the identity was created
    pub created_at: DateTime<Utc>,
    /// Last profile change
    pub updated_at: DateTime<Utc>,
}

/// An identity that has not been persisted yet; the store assigns the ID.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewIdentity {
    pub fn into_identity(self, id: String) -> Identity {
        Identity {
            id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            status: String::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Last-issued session credentials, kept for audit and lookup.
///
/// Both tokens are absent until the first sign-up or log-in completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionTokens {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionTokens {
    /// Overwrite only the fields that are present.
    ///
    /// Returns `false` when there was nothing to change.
    pub fn merge(
        &mut self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if access_token.is_none() && refresh_token.is_none() {
            return false;
        }
        if let Some(token) = access_token {
            self.access_token = Some(token.to_string());
        }
        if let Some(token) = refresh_token {
            self.refresh_token = Some(token.to_string());
        }
        self.updated_at = Some(now);
        true
    }
}
