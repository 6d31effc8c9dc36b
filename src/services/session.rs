// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session workflow: the request-level operations of the API.
//!
//! Each method is one request's worth of work composed from the credential
//! codec, token service, identity store, visibility graph and location
//! ledger. Nothing here is kept between requests.

use super::credentials::{self, CredentialError};
use super::{Clock, LocationLedger, TokenService, VisibilityGraph};
use crate::db::{IdentityStore, Storage};
use crate::error::{AppError, Result};
use crate::models::payloads::{
    AuthResponse, FriendDetails, LogInRequest, ObserveRequest, ProfileResponse, SignUpRequest,
    UpdateStatusRequest,
};
use crate::models::{Identity, LocationDetails, LocationUpdate, NewIdentity};
use futures_util::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

const MAX_CONCURRENT_LOCATION_READS: usize = 50;

#[derive(Clone)]
pub struct SessionWorkflow {
    identities: Arc<dyn IdentityStore>,
    tokens: TokenService,
    graph: VisibilityGraph,
    ledger: LocationLedger,
    clock: Arc<dyn Clock>,
}

impl SessionWorkflow {
    pub fn new(storage: Storage, tokens: TokenService, clock: Arc<dyn Clock>) -> Self {
        Self {
            identities: storage.identities,
            tokens,
            graph: VisibilityGraph::new(storage.edges),
            ledger: LocationLedger::new(storage.locations, clock.clone()),
            clock,
        }
    }

    // ─── Authentication ──────────────────────────────────────────

    /// Register a new identity and log it in.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AuthResponse> {
        request.validate()?;

        let password = request.password;
        let password_hash = run_blocking(move || credentials::hash_password(&password)).await?;

        let identity = self
            .identities
            .create(NewIdentity {
                username: request.name,
                password_hash,
                email: request.email,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(
            identity_id = %identity.id,
            username = %identity.username,
            "New identity signed up"
        );

        self.issue_tokens(&identity).await
    }

    /// Check credentials and issue a new token pair.
    ///
    /// Tokens issued by earlier log-ins stay valid until they expire.
    pub async fn log_in(&self, request: LogInRequest) -> Result<AuthResponse> {
        request.validate()?;

        let identity = self.identities.find_by_username(&request.name).await?;

        let hash = identity.password_hash.clone();
        let password = request.password;
        if let Err(e) = run_blocking(move || credentials::verify_password(&hash, &password)).await
        {
            if matches!(e, AppError::Forbidden) {
                tracing::warn!(identity_id = %identity.id, "Log-in with wrong password");
            }
            return Err(e);
        }

        tracing::info!(identity_id = %identity.id, "Identity logged in");
        self.issue_tokens(&identity).await
    }

    async fn issue_tokens(&self, identity: &Identity) -> Result<AuthResponse> {
        let issued = self.tokens.issue(&identity.username, &identity.id)?;

        self.identities
            .update_tokens(
                &identity.id,
                Some(&issued.access_token),
                Some(&issued.refresh_token),
            )
            .await?;

        tracing::debug!(
            identity_id = %identity.id,
            expires_at = %issued.expires_at,
            "Issued session tokens"
        );

        Ok(AuthResponse {
            id: identity.id.clone(),
            token: issued.access_token,
            refresh_token: issued.refresh_token,
        })
    }

    // ─── Profile ─────────────────────────────────────────────────

    pub async fn profile(&self, identity_id: &str) -> Result<ProfileResponse> {
        let (identity, location) = tokio::try_join!(
            self.identities.find_by_id(identity_id),
            self.ledger.get(identity_id)
        )?;

        Ok(ProfileResponse {
            id: identity.id,
            username: identity.username,
            status: identity.status,
            location: location.map(|loc| LocationDetails::from(Some(loc))),
        })
    }

    pub async fn update_status(&self, identity_id: &str, request: UpdateStatusRequest) -> Result<()> {
        request.validate()?;
        self.identities
            .update_status(identity_id, &request.status)
            .await?;
        tracing::debug!(identity_id, "Status updated");
        Ok(())
    }

    pub async fn update_location(&self, identity_id: &str, update: LocationUpdate) -> Result<()> {
        update.validate()?;
        self.ledger.update(identity_id, update).await?;
        tracing::debug!(identity_id, "Location updated");
        Ok(())
    }

    // ─── Observation ─────────────────────────────────────────────

    pub async fn observe(&self, identity_id: &str, request: ObserveRequest) -> Result<()> {
        request.validate()?;
        let target = self.resolve_target(&request.username).await?;

        if target.id == identity_id {
            return Err(AppError::InvalidRequest(
                "cannot observe yourself".to_string(),
            ));
        }

        self.graph.observe(identity_id, &target.id).await?;
        tracing::debug!(identity_id, target_id = %target.id, "Observing user");
        Ok(())
    }

    pub async fn unobserve(&self, identity_id: &str, request: ObserveRequest) -> Result<()> {
        request.validate()?;
        let target = self.resolve_target(&request.username).await?;

        self.graph.unobserve(identity_id, &target.id).await?;
        tracing::debug!(identity_id, target_id = %target.id, "Stopped observing user");
        Ok(())
    }

    async fn resolve_target(&self, username: &str) -> Result<Identity> {
        self.identities
            .find_by_username(username)
            .await
            .map_err(|e| match e {
                crate::db::StoreError::NotFound => {
                    AppError::NotFound(format!("user {} not found", username))
                }
                other => other.into(),
            })
    }

    // ─── Friends ─────────────────────────────────────────────────

    /// Mutual friends of the requester with their status and location.
    ///
    /// Friends that never reported a position get the zero location.
    pub async fn friends(&self, identity_id: &str) -> Result<Vec<FriendDetails>> {
        let requester = self.identities.find_by_id(identity_id).await?;

        let mutual = self.graph.mutual_friends_of(&requester.id).await?;
        if mutual.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.identities.find_by_ids(&mutual).await?;

        let dangling: HashSet<&String> = mutual.iter().filter(|id| !found.contains_key(*id)).collect();
        for missing in dangling {
            self.prune_dangling(&requester.id, missing).await;
        }

        let mut friends = stream::iter(found.into_values())
            .map(|friend| async move {
                let location = self.ledger.get(&friend.id).await?;
                Ok::<_, AppError>(FriendDetails {
                    username: friend.username,
                    status: friend.status,
                    location: LocationDetails::from(location),
                })
            })
            .buffer_unordered(MAX_CONCURRENT_LOCATION_READS)
            .collect::<Vec<Result<FriendDetails>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<FriendDetails>>>()?;

        friends.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(friends)
    }

    /// Drop both edges between the requester and an identity that no
    /// longer exists. Failures are logged; the friend list is still served.
    async fn prune_dangling(&self, requester_id: &str, missing_id: &str) {
        tracing::warn!(
            identity_id = requester_id,
            missing_id,
            "Pruning observation edges to missing identity"
        );

        let result = tokio::try_join!(
            self.graph.unobserve(requester_id, missing_id),
            self.graph.unobserve(missing_id, requester_id)
        );
        if let Err(e) = result {
            tracing::error!(error = %e, missing_id, "Failed to prune dangling edges");
        }
    }
}

/// Run a password operation on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, CredentialError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password task failed: {}", e)))?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{EdgeStore, MemoryDb};
    use crate::services::ManualClock;
    use chrono::Utc;

    fn workflow() -> (SessionWorkflow, MemoryDb) {
        let db = MemoryDb::new();
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let tokens = TokenService::new(b"unit-test-key", chrono::Duration::hours(168), clock.clone());
        (
            SessionWorkflow::new(Storage::from_backend(db.clone()), tokens, clock),
            db,
        )
    }

    fn sign_up(name: &str) -> SignUpRequest {
        SignUpRequest {
            name: name.to_string(),
            password: "secret123".to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_sign_up_stores_issued_tokens() {
        let (session, db) = workflow();
        let auth = session.sign_up(sign_up("alice")).await.unwrap();

        let stored = db.get_tokens(&auth.id).await.unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some(auth.token.as_str()));
        assert_eq!(
            stored.refresh_token.as_deref(),
            Some(auth.refresh_token.as_str())
        );
    }

    #[tokio::test]
    async fn test_invalid_sign_up_has_no_side_effects() {
        let (session, db) = workflow();
        let mut request = sign_up("alice");
        request.password = "short".to_string();

        let err = session.sign_up(request).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert!(db.find_by_username("alice").await.is_err());
    }

    #[tokio::test]
    async fn test_cannot_observe_self() {
        let (session, _) = workflow();
        let auth = session.sign_up(sign_up("alice")).await.unwrap();

        let err = session
            .observe(
                &auth.id,
                ObserveRequest {
                    username: "alice".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_dangling_edges_are_pruned() {
        let (session, db) = workflow();
        let alice = session.sign_up(sign_up("alice")).await.unwrap();

        db.insert_edge(&alice.id, "gone").await.unwrap();
        db.insert_edge("gone", &alice.id).await.unwrap();

        assert!(session.friends(&alice.id).await.unwrap().is_empty());
        assert!(db.targets_of(&alice.id).await.unwrap().is_empty());
        assert!(db.observers_of(&alice.id).await.unwrap().is_empty());
    }
}
