// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process storage backend.
//!
//! Same semantics as the Firestore backend, held in `DashMap`s. Username
//! uniqueness is enforced with the entry API, so two concurrent sign-ups
//! with the same name race on the map shard lock and exactly one wins.

use super::{new_identity_id, EdgeStore, IdentityStore, LocationStore, StoreError};
use crate::models::{Identity, Location, NewIdentity, Observation, SessionTokens};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    users: DashMap<String, Identity>,
    /// Unique index: username -> identity ID
    usernames: DashMap<String, String>,
    tokens: DashMap<String, SessionTokens>,
    observations: DashMap<(String, String), Observation>,
    locations: DashMap<String, Location>,
}

/// In-memory database. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryDb {
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        // Snapshot first: `create` locks usernames before users.
        let users: Vec<(String, String)> = self
            .inner
            .users
            .iter()
            .map(|user| (user.id.clone(), user.username.clone()))
            .collect();

        let mut backfilled = 0usize;
        for (id, username) in users {
            match self.inner.usernames.entry(username) {
                Entry::Vacant(slot) => {
                    slot.insert(id);
                    backfilled += 1;
                }
                Entry::Occupied(slot) if slot.get() != &id => {
                    tracing::warn!(
                        identity_id = %id,
                        owner_id = %slot.get(),
                        "Username already claimed by another identity"
                    );
                }
                Entry::Occupied(_) => {}
            }
        }

        tracing::info!(backfilled, "Username index ensured (memory)");
        Ok(())
    }

    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let identity = identity.into_identity(new_identity_id());

        match self.inner.usernames.entry(identity.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::UsernameTaken),
            Entry::Vacant(slot) => {
                slot.insert(identity.id.clone());
                self.inner
                    .users
                    .insert(identity.id.clone(), identity.clone());
                Ok(identity)
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Identity, StoreError> {
        self.inner
            .users
            .get(id)
            .map(|user| user.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        let id = self
            .inner
            .usernames
            .get(username)
            .map(|id| id.clone())
            .ok_or(StoreError::NotFound)?;
        self.find_by_id(&id).await
    }

    async fn find_by_ids(
        &self,
        ids: &HashSet<String>,
    ) -> Result<HashMap<String, Identity>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.inner
                    .users
                    .get(id)
                    .map(|user| (id.clone(), user.clone()))
            })
            .collect())
    }

    async fn update_tokens(
        &self,
        id: &str,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError> {
        if access_token.is_none() && refresh_token.is_none() {
            return Ok(());
        }
        if !self.inner.users.contains_key(id) {
            return Err(StoreError::NotFound);
        }

        self.inner
            .tokens
            .entry(id.to_string())
            .or_default()
            .merge(access_token, refresh_token, chrono::Utc::now());
        Ok(())
    }

    async fn get_tokens(&self, id: &str) -> Result<Option<SessionTokens>, StoreError> {
        Ok(self.inner.tokens.get(id).map(|tokens| tokens.clone()))
    }

    async fn update_status(&self, id: &str, status: &str) -> Result<(), StoreError> {
        let mut user = self.inner.users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.status = status.to_string();
        user.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[async_trait]
impl EdgeStore for MemoryDb {
    async fn insert_edge(&self, observer_id: &str, target_id: &str) -> Result<(), StoreError> {
        self.inner
            .observations
            .entry((observer_id.to_string(), target_id.to_string()))
            .or_insert_with(|| Observation {
                observer_id: observer_id.to_string(),
                target_id: target_id.to_string(),
                created_at: chrono::Utc::now(),
            });
        Ok(())
    }

    async fn remove_edge(&self, observer_id: &str, target_id: &str) -> Result<(), StoreError> {
        self.inner
            .observations
            .remove(&(observer_id.to_string(), target_id.to_string()));
        Ok(())
    }

    async fn targets_of(&self, observer_id: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self
            .inner
            .observations
            .iter()
            .filter(|edge| edge.observer_id == observer_id)
            .map(|edge| edge.target_id.clone())
            .collect())
    }

    async fn observers_of(&self, target_id: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self
            .inner
            .observations
            .iter()
            .filter(|edge| edge.target_id == target_id)
            .map(|edge| edge.observer_id.clone())
            .collect())
    }
}

#[async_trait]
impl LocationStore for MemoryDb {
    async fn put_location(&self, id: &str, location: &Location) -> Result<(), StoreError> {
        self.inner
            .locations
            .insert(id.to_string(), location.clone());
        Ok(())
    }

    async fn get_location(&self, id: &str) -> Result<Option<Location>, StoreError> {
        Ok(self.inner.locations.get(id).map(|loc| loc.clone()))
    }
}
