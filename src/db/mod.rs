// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! The core talks to storage only through the capability traits below.
//! Two backends implement all of them: [`FirestoreDb`] for deployments and
//! [`MemoryDb`] for local development and tests. The backend is chosen once
//! at startup by [`connect`]; nothing switches backends per call.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::{Config, StorageBackend};
use crate::models::{Identity, Location, NewIdentity, SessionTokens};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Unique-key claims, keyed by URL-encoded username
    pub const USERNAMES: &str = "usernames";
    pub const TOKENS: &str = "tokens";
    /// Directed observation edges, keyed by `{observer}_{target}`
    pub const OBSERVATIONS: &str = "observations";
    pub const LOCATIONS: &str = "locations";
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The unique-username constraint rejected the write.
    #[error("username is already in use")]
    UsernameTaken,

    #[error("identity not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Identity records: creation, lookup and the fields owned by the identity.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Make sure every identity's username is covered by the unique index.
    ///
    /// Safe to call any number of times.
    async fn ensure_indexes(&self) -> Result<(), StoreError>;

    /// Persist a new identity under a freshly generated ID.
    ///
    /// Fails with [`StoreError::UsernameTaken`] when the unique constraint
    /// rejects the username. There is no existence check beforehand.
    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Identity, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError>;

    /// Batch lookup. IDs with no identity are left out of the result.
    async fn find_by_ids(
        &self,
        ids: &HashSet<String>,
    ) -> Result<HashMap<String, Identity>, StoreError>;

    /// Store the latest issued tokens. `None` fields are left untouched and
    /// a call with both absent does nothing.
    async fn update_tokens(
        &self,
        id: &str,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn get_tokens(&self, id: &str) -> Result<Option<SessionTokens>, StoreError>;

    async fn update_status(&self, id: &str, status: &str) -> Result<(), StoreError>;
}

/// Directed observation edges between identity IDs.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Idempotent: inserting an existing edge changes nothing.
    async fn insert_edge(&self, observer_id: &str, target_id: &str) -> Result<(), StoreError>;

    /// Idempotent: removing a missing edge is not an error.
    async fn remove_edge(&self, observer_id: &str, target_id: &str) -> Result<(), StoreError>;

    /// IDs that `observer_id` observes.
    async fn targets_of(&self, observer_id: &str) -> Result<HashSet<String>, StoreError>;

    /// IDs that observe `target_id`.
    async fn observers_of(&self, target_id: &str) -> Result<HashSet<String>, StoreError>;
}

/// Last-known position per identity.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Replace the stored location wholesale.
    async fn put_location(&self, id: &str, location: &Location) -> Result<(), StoreError>;

    /// `None` when the identity never reported a position.
    async fn get_location(&self, id: &str) -> Result<Option<Location>, StoreError>;
}

/// Storage capabilities handed to the core services.
#[derive(Clone)]
pub struct Storage {
    pub identities: Arc<dyn IdentityStore>,
    pub edges: Arc<dyn EdgeStore>,
    pub locations: Arc<dyn LocationStore>,
}

impl Storage {
    /// Serve all three capabilities from one backend.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: IdentityStore + EdgeStore + LocationStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            identities: backend.clone(),
            edges: backend.clone(),
            locations: backend,
        }
    }
}

/// Connect to the backend selected by configuration.
pub async fn connect(config: &Config) -> Result<Storage, StoreError> {
    match config.storage_backend {
        StorageBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            Ok(Storage::from_backend(db))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            Ok(Storage::from_backend(MemoryDb::new()))
        }
    }
}

/// Generate a new opaque identity ID.
pub(crate) fn new_identity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
