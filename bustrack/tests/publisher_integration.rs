//! Integration tests for the location publisher's last-write-wins contract.
//!
//! Run with: `cargo test --test publisher_integration`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bustrack::journey::{JourneyState, JourneyStatus};
use bustrack::publisher::{LocationPublisher, PublisherConfig};
use bustrack::store::{BusId, BusSnapshot, InMemoryLocationStore, LocationStore, StoreError};

// ============================================================================
// Test Helpers
// ============================================================================

fn state_at(cursor: usize) -> JourneyState {
    JourneyState {
        cursor_index: cursor,
        status: JourneyStatus::Running,
        ..Default::default()
    }
}

/// Store that records the cursor of every write, with a jittery delay.
struct JitteryStore {
    inner: InMemoryLocationStore,
    writes: Mutex<Vec<usize>>,
}

impl LocationStore for JitteryStore {
    async fn upsert(&self, bus: &BusId, state: &JourneyState) -> Result<(), StoreError> {
        // Odd cursors are slow, even ones fast
        let delay = if state.cursor_index % 2 == 1 { 30 } else { 5 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.writes.lock().unwrap().push(state.cursor_index);
        self.inner.upsert(bus, state).await
    }

    async fn get(&self, bus: &BusId) -> Result<Option<JourneyState>, StoreError> {
        self.inner.get(bus).await
    }

    async fn fleet(&self) -> Result<Vec<BusSnapshot>, StoreError> {
        self.inner.fleet().await
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_hundred_publishes_never_regress() {
    let bus = BusId::new("1");
    let store = Arc::new(JitteryStore {
        inner: InMemoryLocationStore::new(),
        writes: Mutex::new(Vec::new()),
    });
    let publisher = LocationPublisher::start(Arc::clone(&store), bus.clone(), PublisherConfig::default());

    let mut last_seen = 0;
    for cursor in 1..=100 {
        publisher.publish(&state_at(cursor));
        tokio::time::sleep(Duration::from_millis(10)).await;

        if let Some(current) = store.get(&bus).await.unwrap() {
            assert!(
                current.cursor_index >= last_seen,
                "store went back from {} to {}",
                last_seen,
                current.cursor_index
            );
            last_seen = current.cursor_index;
        }
    }

    publisher.flushed().await;
    assert_eq!(store.get(&bus).await.unwrap().unwrap().cursor_index, 100);

    let writes = store.writes.lock().unwrap().clone();
    assert!(writes.windows(2).all(|w| w[0] < w[1]), "writes out of order: {:?}", writes);
}

#[tokio::test]
async fn test_buses_publish_independently() {
    let store = Arc::new(InMemoryLocationStore::new());
    let first = LocationPublisher::start(Arc::clone(&store), BusId::new("A"), PublisherConfig::default());
    let second = LocationPublisher::start(Arc::clone(&store), BusId::new("B"), PublisherConfig::default());

    first.publish(&state_at(10));
    second.publish(&state_at(20));
    first.shutdown().await;
    second.shutdown().await;

    let fleet = store.fleet().await.unwrap();
    let cursors: Vec<(String, usize)> = fleet
        .into_iter()
        .map(|s| (s.bus_number.to_string(), s.state.cursor_index))
        .collect();
    assert_eq!(cursors, vec![("A".to_string(), 10), ("B".to_string(), 20)]);
}
