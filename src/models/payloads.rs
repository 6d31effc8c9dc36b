// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Request and response bodies exchanged with clients.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use super::LocationDetails;

/// Sign-up details.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    /// Username, must be unique
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Password, at least 8 characters
    #[validate(length(min = 8, max = 1024))]
    pub password: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

/// Log-in details.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogInRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

/// Issued credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct AuthResponse {
    pub id: String,
    /// Bearer token for authenticated requests
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(max = 280))]
    pub status: String,
}

/// Identifies the user to observe or stop observing.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ObserveRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
}

/// A mutual friend as seen by the requester.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct FriendDetails {
    pub username: String,
    pub status: String,
    pub location: LocationDetails,
}

/// The requester's own profile.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub status: String,
    pub location: Option<LocationDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_validation() {
        let ok = SignUpRequest {
            name: "alice".into(),
            password: "secret123".into(),
            email: None,
        };
        assert!(ok.validate().is_ok());

        let short = SignUpRequest {
            password: "short".into(),
            ..ok.clone()
        };
        assert!(short.validate().is_err());

        let bad_email = SignUpRequest {
            email: Some("not-an-email".into()),
            ..ok.clone()
        };
        assert!(bad_email.validate().is_err());

        let empty_name = SignUpRequest {
            name: String::new(),
            ..ok
        };
        assert!(empty_name.validate().is_err());
    }
}
