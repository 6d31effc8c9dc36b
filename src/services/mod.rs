// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod clock;
pub mod credentials;
pub mod location;
pub mod session;
pub mod tokens;
pub mod visibility;

pub use clock::{Clock, ManualClock, SystemClock};
pub use location::LocationLedger;
pub use session::SessionWorkflow;
pub use tokens::{AccessClaims, TokenError, TokenService};
pub use visibility::VisibilityGraph;
