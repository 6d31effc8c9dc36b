// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Observation edges and the mutual-friend relation derived from them.
//!
//! "A observes B" is one-directional interest. B's location becomes
//! visible to A only once B also observes A. Friendship is computed from
//! the two directions on every read and never stored.

use crate::db::{EdgeStore, StoreError};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct VisibilityGraph {
    edges: Arc<dyn EdgeStore>,
}

impl VisibilityGraph {
    pub fn new(edges: Arc<dyn EdgeStore>) -> Self {
        Self { edges }
    }

    /// Add the edge `observer -> target`.
    ///
    /// The caller resolves `target_id` to an existing identity first; this
    /// layer does not check.
    pub async fn observe(&self, observer_id: &str, target_id: &str) -> Result<(), StoreError> {
        self.edges.insert_edge(observer_id, target_id).await
    }

    pub async fn unobserve(&self, observer_id: &str, target_id: &str) -> Result<(), StoreError> {
        self.edges.remove_edge(observer_id, target_id).await
    }

    pub async fn observed_by(&self, observer_id: &str) -> Result<HashSet<String>, StoreError> {
        self.edges.targets_of(observer_id).await
    }

    /// IDs with edges in both directions to `id`.
    pub async fn mutual_friends_of(&self, id: &str) -> Result<HashSet<String>, StoreError> {
        let (observed, observers) = tokio::try_join!(
            self.edges.targets_of(id),
            self.edges.observers_of(id)
        )?;

        Ok(observed
            .intersection(&observers)
            .filter(|other| other.as_str() != id)
            .cloned()
            .collect())
    }
}
