//! Location subscriber - the observer side of the shared store.
//!
//! A subscriber follows one bus and keeps a [`SubscriberView`]: the last
//! journey state it read plus a [`ConnectivityState`] describing the health
//! of the link. Two strategies sit behind the same [`SubscriberHandle`]:
//!
//! - **poll** - `get` on a fixed interval, each read bounded by a timeout
//! - **push** - one seed read, then the store's change feed
//!
//! # Usage
//!
//! ```ignore
//! let subscriber = LocationSubscriber::new(BusId::new("1"), SubscriberConfig::default());
//! let mut handle = subscriber.attach_polling(store);
//! while let Some(view) = handle.changed().await {
//!     println!("{} {:?}", view.connectivity, view.journey);
//! }
//! ```

mod poll;
mod push;
mod view;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use view::{ConnectivityState, ReadOutcome, SubscriberView};

use crate::store::{BusId, LocationStore, StoreChanges};

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default per-read time budget.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Shortest poll interval; smaller values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a subscriber learns about changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriberStrategy {
    #[default]
    Poll,
    Push,
}

impl fmt::Display for SubscriberStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberStrategy::Poll => write!(f, "poll"),
            SubscriberStrategy::Push => write!(f, "push"),
        }
    }
}

impl FromStr for SubscriberStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "poll" | "polling" => Ok(SubscriberStrategy::Poll),
            "push" => Ok(SubscriberStrategy::Push),
            other => Err(format!("unknown strategy '{}' (expected poll or push)", other)),
        }
    }
}

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Subscriber for one bus.
#[derive(Debug, Clone)]
pub struct LocationSubscriber {
    bus_id: BusId,
    config: SubscriberConfig,
}

impl LocationSubscriber {
    pub fn new(bus_id: BusId, mut config: SubscriberConfig) -> Self {
        if config.poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                poll_ms = config.poll_interval.as_millis() as u64,
                min_ms = MIN_POLL_INTERVAL.as_millis() as u64,
                "Poll interval too short, using minimum"
            );
            config.poll_interval = MIN_POLL_INTERVAL;
        }
        Self { bus_id, config }
    }

    /// Attach by polling `store`.
    pub fn attach_polling<S: LocationStore>(&self, store: Arc<S>) -> SubscriberHandle {
        let (view_tx, cancel) = self.prepare();
        let view_rx = view_tx.subscribe();
        let task = tokio::spawn(poll::run_polling(
            store,
            self.bus_id.clone(),
            self.config.poll_interval,
            self.config.request_timeout,
            view_tx,
            cancel.clone(),
        ));
        SubscriberHandle::new(self.bus_id.clone(), view_rx, cancel, task)
    }

    /// Attach to `store`'s change feed.
    pub fn attach_push<S: LocationStore + StoreChanges>(&self, store: Arc<S>) -> SubscriberHandle {
        let (view_tx, cancel) = self.prepare();
        let view_rx = view_tx.subscribe();
        let task = tokio::spawn(push::run_push(
            store,
            self.bus_id.clone(),
            self.config.request_timeout,
            view_tx,
            cancel.clone(),
        ));
        SubscriberHandle::new(self.bus_id.clone(), view_rx, cancel, task)
    }

    fn prepare(&self) -> (watch::Sender<SubscriberView>, CancellationToken) {
        let mut view = SubscriberView::new();
        view.connecting();
        let (view_tx, _) = watch::channel(view);
        (view_tx, CancellationToken::new())
    }
}

/// Handle to an attached subscriber. Dropping it detaches.
pub struct SubscriberHandle {
    bus_id: BusId,
    view_rx: watch::Receiver<SubscriberView>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriberHandle {
    fn new(
        bus_id: BusId,
        view_rx: watch::Receiver<SubscriberView>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            bus_id,
            view_rx,
            cancel,
            task: Some(task),
        }
    }

    pub fn bus_id(&self) -> &BusId {
        &self.bus_id
    }

    /// Current view.
    pub fn view(&self) -> SubscriberView {
        self.view_rx.borrow().clone()
    }

    /// Wait for the next view update. `None` once the subscriber has stopped.
    pub async fn changed(&mut self) -> Option<SubscriberView> {
        self.view_rx.changed().await.ok()?;
        Some(self.view_rx.borrow_and_update().clone())
    }

    /// A receiver of every view update.
    pub fn watch(&self) -> watch::Receiver<SubscriberView> {
        self.view_rx.clone()
    }

    /// Cancel the subscription and wait for its task to end.
    pub async fn detach(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(bus = %self.bus_id, error = %e, "Subscriber task failed");
            }
        }
    }
}

impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::{JourneyState, JourneyStatus};
    use crate::store::{BusSnapshot, InMemoryLocationStore, StoreError, StoreUpdate};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::broadcast;

    fn state_at(cursor: usize) -> JourneyState {
        JourneyState {
            cursor_index: cursor,
            status: JourneyStatus::Running,
            ..Default::default()
        }
    }

    fn config() -> SubscriberConfig {
        SubscriberConfig {
            poll_interval: Duration::from_millis(2000),
            request_timeout: Duration::from_millis(5000),
        }
    }

    /// Store whose reads hang while `stalled` is set.
    struct StallingStore {
        inner: InMemoryLocationStore,
        stalled: AtomicBool,
    }

    impl LocationStore for StallingStore {
        async fn upsert(&self, bus: &BusId, state: &JourneyState) -> Result<(), StoreError> {
            self.inner.upsert(bus, state).await
        }

        async fn get(&self, bus: &BusId) -> Result<Option<JourneyState>, StoreError> {
            if self.stalled.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.inner.get(bus).await
        }

        async fn fleet(&self) -> Result<Vec<BusSnapshot>, StoreError> {
            self.inner.fleet().await
        }
    }

    impl StoreChanges for StallingStore {
        fn changes(&self) -> broadcast::Receiver<StoreUpdate> {
            self.inner.changes()
        }
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("poll".parse::<SubscriberStrategy>(), Ok(SubscriberStrategy::Poll));
        assert_eq!(" Push ".parse::<SubscriberStrategy>(), Ok(SubscriberStrategy::Push));
        assert!("carrier-pigeon".parse::<SubscriberStrategy>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_starts_connecting_then_waits_for_source() {
        let store = Arc::new(InMemoryLocationStore::new());
        let subscriber = LocationSubscriber::new(BusId::new("1"), config());
        let mut handle = subscriber.attach_polling(store);

        assert_eq!(handle.view().connectivity, ConnectivityState::Connecting);

        let view = handle.changed().await.unwrap();
        assert_eq!(view.connectivity, ConnectivityState::WaitingForSource);
        assert!(view.journey.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_picks_up_published_state() {
        let store = Arc::new(InMemoryLocationStore::new());
        let bus = BusId::new("1");
        store.upsert(&bus, &state_at(12)).await.unwrap();

        let subscriber = LocationSubscriber::new(bus, config());
        let mut handle = subscriber.attach_polling(Arc::clone(&store));

        let view = handle.changed().await.unwrap();
        assert_eq!(view.connectivity, ConnectivityState::Online);
        assert_eq!(view.journey.unwrap().cursor_index, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_is_raised_to_minimum() {
        let store = Arc::new(InMemoryLocationStore::new());
        let bus = BusId::new("1");
        store.upsert(&bus, &state_at(4)).await.unwrap();

        let subscriber = LocationSubscriber::new(
            bus,
            SubscriberConfig {
                poll_interval: Duration::ZERO,
                ..config()
            },
        );
        assert_eq!(subscriber.config.poll_interval, MIN_POLL_INTERVAL);

        let mut handle = subscriber.attach_polling(Arc::clone(&store));
        let view = handle.changed().await.unwrap();
        assert_eq!(view.connectivity, ConnectivityState::Online);
        assert_eq!(view.journey.unwrap().cursor_index, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_times_out_and_recovers() {
        let bus = BusId::new("1");
        let store = Arc::new(StallingStore {
            inner: InMemoryLocationStore::new(),
            stalled: AtomicBool::new(false),
        });
        store.upsert(&bus, &state_at(5)).await.unwrap();

        let subscriber = LocationSubscriber::new(bus.clone(), config());
        let mut handle = subscriber.attach_polling(Arc::clone(&store));
        assert!(handle.changed().await.unwrap().connectivity.is_online());

        store.stalled.store(true, Ordering::SeqCst);
        let view = handle.changed().await.unwrap();
        assert_eq!(view.connectivity, ConnectivityState::TimedOut);
        assert_eq!(view.journey.as_ref().unwrap().cursor_index, 5);

        store.stalled.store(false, Ordering::SeqCst);
        store.upsert(&bus, &state_at(6)).await.unwrap();

        // A read already in flight may time out once more before recovery
        let view = loop {
            let view = handle.changed().await.unwrap();
            if view.connectivity.is_online() {
                break view;
            }
            assert_eq!(view.connectivity, ConnectivityState::TimedOut);
        };
        assert_eq!(view.journey.unwrap().cursor_index, 6);
    }

    #[tokio::test]
    async fn test_push_follows_only_its_bus() {
        let store = Arc::new(InMemoryLocationStore::new());
        let bus = BusId::new("1");
        let subscriber = LocationSubscriber::new(bus.clone(), config());
        let mut handle = subscriber.attach_push(Arc::clone(&store));

        let seeded = handle.changed().await.unwrap();
        assert_eq!(seeded.connectivity, ConnectivityState::WaitingForSource);

        store.upsert(&BusId::new("2"), &state_at(99)).await.unwrap();
        store.upsert(&bus, &state_at(3)).await.unwrap();

        let view = handle.changed().await.unwrap();
        assert_eq!(view.connectivity, ConnectivityState::Online);
        assert_eq!(view.journey.unwrap().cursor_index, 3);
    }

    #[tokio::test]
    async fn test_detach_stops_updates() {
        let store = Arc::new(InMemoryLocationStore::new());
        let subscriber = LocationSubscriber::new(BusId::new("1"), config());
        let mut handle = subscriber.attach_push(Arc::clone(&store));
        handle.changed().await.unwrap();

        let mut watch = handle.watch();
        handle.detach().await;

        store.upsert(&BusId::new("1"), &state_at(1)).await.unwrap();
        // Sender is gone once the task has ended
        assert!(watch.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_interrupts_lagged_reread() {
        let bus = BusId::new("1");
        let store = Arc::new(StallingStore {
            inner: InMemoryLocationStore::new(),
            stalled: AtomicBool::new(false),
        });
        let subscriber = LocationSubscriber::new(bus.clone(), config());
        let mut handle = subscriber.attach_push(Arc::clone(&store));
        handle.changed().await.unwrap();

        // Overflow the change feed while reads hang
        store.stalled.store(true, Ordering::SeqCst);
        for cursor in 0..200 {
            store.upsert(&BusId::new("2"), &state_at(cursor)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = tokio::time::Instant::now();
        handle.detach().await;
        assert!(started.elapsed() < config().request_timeout);
    }
}
