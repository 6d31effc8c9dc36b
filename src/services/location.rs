// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Last-known position per identity. No history is kept: each update
//! replaces the previous one, and concurrent updates are last-write-wins.

use super::Clock;
use crate::db::{LocationStore, StoreError};
use crate::models::{Location, LocationUpdate};
use std::sync::Arc;

#[derive(Clone)]
pub struct LocationLedger {
    store: Arc<dyn LocationStore>,
    clock: Arc<dyn Clock>,
}

impl LocationLedger {
    pub fn new(store: Arc<dyn LocationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Overwrite the stored location, stamped with server time.
    pub async fn update(&self, id: &str, update: LocationUpdate) -> Result<Location, StoreError> {
        let location = update.at(self.clock.now());
        self.store.put_location(id, &location).await?;
        Ok(location)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Location>, StoreError> {
        self.store.get_location(id).await
    }
}
