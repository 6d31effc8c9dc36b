// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod location;
pub mod observation;
pub mod payloads;
pub mod user;

pub use location::{Location, LocationDetails, LocationUpdate};
pub use observation::Observation;
pub use user::{Identity, NewIdentity, SessionTokens};
