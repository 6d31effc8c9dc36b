// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (identity records) and their unique username claims
//! - Tokens (last issued session credentials)
//! - Observations (directed edges between users)
//! - Locations (last-known position per user)

use super::{
    collections, new_identity_id, EdgeStore, IdentityStore, LocationStore, StoreError,
};
use crate::models::{Identity, Location, NewIdentity, Observation, SessionTokens};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Unique-key claim document in the `usernames` collection.
///
/// Creating it is the only uniqueness check; Firestore rejects a second
/// create of the same document ID with ALREADY_EXISTS.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UsernameClaim {
    identity_id: String,
}

/// Document ID of a username claim. Encoded so that names containing `/`
/// or made of dots still form a valid document ID.
fn username_doc_id(username: &str) -> String {
    format!("name_{}", urlencoding::encode(username))
}

fn backend(e: FirestoreError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        // The emulator rejects nothing, but the default token source would
        // still go looking for local GCP credentials.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Backend("Database not connected (offline mode)".to_string()))
    }

    async fn get_user(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(backend)
    }

    async fn put_user(&self, user: &Identity) -> Result<(), StoreError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    /// Insert-if-absent on the username claim.
    async fn claim_username(&self, username: &str, identity_id: &str) -> Result<(), StoreError> {
        let claim = UsernameClaim {
            identity_id: identity_id.to_string(),
        };

        let result: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERNAMES)
            .document_id(username_doc_id(username))
            .object(&claim)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(StoreError::UsernameTaken),
            Err(e) => Err(backend(e)),
        }
    }

    async fn get_claim(&self, username: &str) -> Result<Option<UsernameClaim>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERNAMES)
            .obj()
            .one(&username_doc_id(username))
            .await
            .map_err(backend)
    }

    async fn release_username(&self, username: &str) -> Result<(), StoreError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERNAMES)
            .document_id(username_doc_id(username))
            .execute()
            .await
            .map_err(backend)
    }

    async fn query_edges(&self, field: &'static str, id: &str) -> Result<Vec<Observation>, StoreError> {
        let id = id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::OBSERVATIONS)
            .filter(move |q| q.for_all([q.field(field).eq(id.clone())]))
            .obj()
            .query()
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl IdentityStore for FirestoreDb {
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let users: Vec<Identity> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(backend)?;

        let mut backfilled = 0usize;
        for user in &users {
            match self.claim_username(&user.username, &user.id).await {
                Ok(()) => backfilled += 1,
                Err(StoreError::UsernameTaken) => {
                    let owner = self.get_claim(&user.username).await?;
                    if let Some(owner) = owner.filter(|c| c.identity_id != user.id) {
                        tracing::warn!(
                            identity_id = %user.id,
                            owner_id = %owner.identity_id,
                            "Username already claimed by another identity"
                        );
                    }
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            users = users.len(),
            backfilled,
            "Username index ensured (Firestore)"
        );
        Ok(())
    }

    async fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let identity = identity.into_identity(new_identity_id());

        self.claim_username(&identity.username, &identity.id).await?;

        let written: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&identity.id)
            .object(&identity)
            .execute()
            .await;

        if let Err(e) = written {
            // Give the name back so a retry can succeed.
            if let Err(release_err) = self.release_username(&identity.username).await {
                tracing::error!(
                    error = %release_err,
                    "Failed to release username claim after aborted sign-up"
                );
            }
            return Err(backend(e));
        }

        tracing::debug!(identity_id = %identity.id, "Identity created");
        Ok(identity)
    }

    async fn find_by_id(&self, id: &str) -> Result<Identity, StoreError> {
        self.get_user(id).await?.ok_or(StoreError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        let claim = self.get_claim(username).await?.ok_or(StoreError::NotFound)?;
        self.find_by_id(&claim.identity_id).await
    }

    async fn find_by_ids(
        &self,
        ids: &HashSet<String>,
    ) -> Result<HashMap<String, Identity>, StoreError> {
        let found = stream::iter(ids.iter().cloned())
            .map(|id| async move { self.get_user(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Identity>, StoreError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Identity>>, StoreError>>()?;

        Ok(found
            .into_iter()
            .flatten()
            .map(|user| (user.id.clone(), user))
            .collect())
    }

    async fn update_tokens(
        &self,
        id: &str,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tokens = self.get_tokens(id).await?.unwrap_or_default();
        if !tokens.merge(access_token, refresh_token, chrono::Utc::now()) {
            return Ok(());
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TOKENS)
            .document_id(id)
            .object(&tokens)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_tokens(&self, id: &str) -> Result<Option<SessionTokens>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TOKENS)
            .obj()
            .one(id)
            .await
            .map_err(backend)
    }

    async fn update_status(&self, id: &str, status: &str) -> Result<(), StoreError> {
        // Fetch-modify-write to preserve other fields
        let mut user = self.find_by_id(id).await?;
        user.status = status.to_string();
        user.updated_at = chrono::Utc::now();
        self.put_user(&user).await
    }
}

#[async_trait]
impl EdgeStore for FirestoreDb {
    async fn insert_edge(&self, observer_id: &str, target_id: &str) -> Result<(), StoreError> {
        let edge = Observation {
            observer_id: observer_id.to_string(),
            target_id: target_id.to_string(),
            created_at: chrono::Utc::now(),
        };

        let result: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::OBSERVATIONS)
            .document_id(Observation::doc_id(observer_id, target_id))
            .object(&edge)
            .execute()
            .await;

        match result {
            // Already observing: keep the original edge untouched.
            Ok(()) | Err(FirestoreError::DataConflictError(_)) => Ok(()),
            Err(e) => Err(backend(e)),
        }
    }

    async fn remove_edge(&self, observer_id: &str, target_id: &str) -> Result<(), StoreError> {
        // Firestore deletes of missing documents succeed.
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::OBSERVATIONS)
            .document_id(Observation::doc_id(observer_id, target_id))
            .execute()
            .await
            .map_err(backend)
    }

    async fn targets_of(&self, observer_id: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self
            .query_edges("observer_id", observer_id)
            .await?
            .into_iter()
            .map(|edge| edge.target_id)
            .collect())
    }

    async fn observers_of(&self, target_id: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self
            .query_edges("target_id", target_id)
            .await?
            .into_iter()
            .map(|edge| edge.observer_id)
            .collect())
    }
}

#[async_trait]
impl LocationStore for FirestoreDb {
    async fn put_location(&self, id: &str, location: &Location) -> Result<(), StoreError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LOCATIONS)
            .document_id(id)
            .object(location)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_location(&self, id: &str) -> Result<Option<Location>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LOCATIONS)
            .obj()
            .one(id)
            .await
            .map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_doc_id_is_path_safe() {
        assert_eq!(username_doc_id("alice"), "name_alice");
        assert_eq!(username_doc_id("a/b"), "name_a%2Fb");
        assert_ne!(username_doc_id(".."), "..");
        assert_ne!(username_doc_id("Alice"), username_doc_id("alice"));
    }

    #[tokio::test]
    async fn test_offline_client_reports_backend_error() {
        let db = FirestoreDb::new_mock();
        let err = db.find_by_username("alice").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
