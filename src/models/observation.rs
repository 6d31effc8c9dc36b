// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Observation edge model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directed "observer wants to see target" edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub observer_id: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
}

impl Observation {
    /// Document ID for the edge; one document per ordered pair.
    pub fn doc_id(observer_id: &str, target_id: &str) -> String {
        format!("{}_{}", observer_id, target_id)
    }
}
