//! Location publisher - mirrors journey state into a [`LocationStore`].
//!
//! Publishing never blocks the simulator. Each [`LocationPublisher::publish`]
//! replaces a single latest-value slot; one writer task drains the slot and
//! performs the upserts one at a time. This gives three guarantees:
//!
//! - writes reach the store in publish order (a single writer)
//! - a slow store coalesces intermediate states instead of queueing them
//! - a failed write is logged and dropped; the next publish supersedes it
//!
//! The writer task exits once the publisher is dropped or shut down, after
//! writing whatever value was still pending.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::journey::JourneyState;
use crate::store::{BusId, LocationStore, StoreError};

/// Default time budget for a single store write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Time budget for one upsert; exceeding it counts as a failed write.
    pub write_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Latest-value slot shared between publisher and writer.
#[derive(Debug, Clone, Default)]
struct Slot {
    version: u64,
    state: Option<JourneyState>,
}

/// Write counters.
#[derive(Debug, Default)]
pub struct PublisherStats {
    published: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
}

impl PublisherStats {
    /// States handed to `publish`.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Upserts that succeeded.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Upserts that failed or timed out.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// States superseded before they were written.
    pub fn coalesced(&self) -> u64 {
        self.published()
            .saturating_sub(self.written() + self.failed())
    }
}

/// Fire-and-forget publisher for one bus.
pub struct LocationPublisher {
    bus_id: BusId,
    slot_tx: watch::Sender<Slot>,
    attempted_rx: watch::Receiver<u64>,
    stats: Arc<PublisherStats>,
    worker: JoinHandle<()>,
}

impl LocationPublisher {
    /// Spawn the writer task for `bus_id` against `store`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S: LocationStore>(store: Arc<S>, bus_id: BusId, config: PublisherConfig) -> Self {
        let (slot_tx, slot_rx) = watch::channel(Slot::default());
        let (attempted_tx, attempted_rx) = watch::channel(0u64);
        let stats = Arc::new(PublisherStats::default());

        let worker = tokio::spawn(run_writer(
            store,
            bus_id.clone(),
            config,
            slot_rx,
            attempted_tx,
            Arc::clone(&stats),
        ));

        Self {
            bus_id,
            slot_tx,
            attempted_rx,
            stats,
            worker,
        }
    }

    pub fn bus_id(&self) -> &BusId {
        &self.bus_id
    }

    pub fn stats(&self) -> &PublisherStats {
        &self.stats
    }

    /// Hand the latest state to the writer. Returns immediately.
    pub fn publish(&self, state: &JourneyState) {
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        self.slot_tx.send_modify(|slot| {
            slot.version += 1;
            slot.state = Some(state.clone());
        });
    }

    /// Wait until every state published so far has been written or dropped.
    ///
    /// Returns early if the writer task is gone.
    pub async fn flushed(&self) {
        let target = self.slot_tx.borrow().version;
        let mut attempted = self.attempted_rx.clone();
        // Err means the writer exited; nothing more will be written.
        let _ = attempted.wait_for(|done| *done >= target).await;
    }

    /// Stop accepting states, write the pending one and wait for the writer.
    pub async fn shutdown(self) {
        let Self {
            bus_id,
            slot_tx,
            worker,
            ..
        } = self;
        drop(slot_tx);

        if let Err(e) = worker.await {
            tracing::warn!(bus = %bus_id, error = %e, "Location writer task failed");
        }
    }
}

/// Writer loop: one upsert in flight at a time, always of the newest value.
async fn run_writer<S: LocationStore>(
    store: Arc<S>,
    bus_id: BusId,
    config: PublisherConfig,
    mut slot_rx: watch::Receiver<Slot>,
    attempted_tx: watch::Sender<u64>,
    stats: Arc<PublisherStats>,
) {
    tracing::debug!(bus = %bus_id, "Location writer started");

    // Err once the publisher is dropped and the last value was seen.
    while slot_rx.changed().await.is_ok() {
        let Slot { version, state } = slot_rx.borrow_and_update().clone();
        let Some(state) = state else {
            continue;
        };

        match write_once(store.as_ref(), &bus_id, &state, config.write_timeout).await {
            Ok(()) => {
                stats.written.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    bus = %bus_id,
                    cursor = state.cursor_index,
                    status = %state.status,
                    "Location written"
                );
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    bus = %bus_id,
                    cursor = state.cursor_index,
                    error = %e,
                    "Failed to write location, dropping update"
                );
            }
        }

        attempted_tx.send_replace(version);
    }

    tracing::debug!(
        bus = %bus_id,
        written = stats.written(),
        failed = stats.failed(),
        "Location writer stopped"
    );
}

async fn write_once<S: LocationStore>(
    store: &S,
    bus_id: &BusId,
    state: &JourneyState,
    budget: Duration,
) -> Result<(), StoreError> {
    match tokio::time::timeout(budget, store.upsert(bus_id, state)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::timeout(budget)),
    }
}
