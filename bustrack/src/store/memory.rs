//! In-process location store.
//!
//! Backs the `demo` command, the HTTP server and most tests. Values live in a
//! [`DashMap`] keyed by bus; every upsert is also broadcast so push
//! subscribers see it without polling.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use super::error::StoreError;
use super::types::{BusId, BusSnapshot, StoreUpdate};
use super::{LocationStore, StoreChanges};
use crate::journey::JourneyState;

/// Capacity of the change broadcast channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Shared in-memory store. Cloning shares the same storage.
#[derive(Clone)]
pub struct InMemoryLocationStore {
    entries: Arc<DashMap<BusId, JourneyState>>,
    changes_tx: broadcast::Sender<StoreUpdate>,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(DashMap::new()),
            changes_tx,
        }
    }

    /// Number of buses with a stored state.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Synchronous read, for callers outside the runtime.
    pub fn snapshot(&self, bus: &BusId) -> Option<JourneyState> {
        self.entries.get(bus).map(|entry| entry.value().clone())
    }
}

impl Default for InMemoryLocationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationStore for InMemoryLocationStore {
    async fn upsert(&self, bus: &BusId, state: &JourneyState) -> Result<(), StoreError> {
        self.entries.insert(bus.clone(), state.clone());

        // No receivers is fine
        let _ = self.changes_tx.send(BusSnapshot {
            bus_number: bus.clone(),
            state: state.clone(),
        });
        Ok(())
    }

    async fn get(&self, bus: &BusId) -> Result<Option<JourneyState>, StoreError> {
        Ok(self.snapshot(bus))
    }

    async fn fleet(&self) -> Result<Vec<BusSnapshot>, StoreError> {
        let mut fleet: Vec<BusSnapshot> = self
            .entries
            .iter()
            .map(|entry| BusSnapshot {
                bus_number: entry.key().clone(),
                state: entry.value().clone(),
            })
            .collect();
        fleet.sort_by(|a, b| a.bus_number.cmp(&b.bus_number));
        Ok(fleet)
    }
}

impl StoreChanges for InMemoryLocationStore {
    fn changes(&self) -> broadcast::Receiver<StoreUpdate> {
        self.changes_tx.subscribe()
    }
}
