//! Shared location store.
//!
//! A keyed last-write-wins register of [`JourneyState`] per bus. The
//! publisher writes to it and subscribers read from it.
//!
//! Two implementations ship with the crate:
//! - [`InMemoryLocationStore`] - in-process, with push notifications
//! - [`crate::backend::BackendClient`] - the HTTP backend, poll only

mod error;
mod memory;
mod types;

use std::future::Future;

use tokio::sync::broadcast;

pub use error::StoreError;
pub use memory::InMemoryLocationStore;
pub use types::{BusId, BusSnapshot, StoreUpdate};

use crate::journey::JourneyState;

/// Keyed register of the latest journey state per bus.
///
/// A `get` after an `upsert` for the same bus returns that value or a newer
/// one. Implementations must be shareable across tasks.
pub trait LocationStore: Send + Sync + 'static {
    /// Replace the stored state for `bus`.
    fn upsert(
        &self,
        bus: &BusId,
        state: &JourneyState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read the stored state for `bus`; `None` if nothing was written yet.
    fn get(
        &self,
        bus: &BusId,
    ) -> impl Future<Output = Result<Option<JourneyState>, StoreError>> + Send;

    /// Read every bus's stored state.
    fn fleet(&self) -> impl Future<Output = Result<Vec<BusSnapshot>, StoreError>> + Send;
}

/// Stores that can push changes instead of being polled.
pub trait StoreChanges {
    /// Subscribe to every future upsert, for all buses.
    fn changes(&self) -> broadcast::Receiver<StoreUpdate>;
}
