//! Integration tests for the HTTP backend.
//!
//! Each test starts a real server on an ephemeral port with a temporary
//! data directory and talks to it through `BackendClient` or raw reqwest:
//! - location upsert/get/fleet through the `LocationStore` impl
//! - attendance and notification logs persisted as JSON arrays
//! - a polling subscriber and a short journey running over HTTP
//!
//! Run with: `cargo test --test backend_integration`

use std::sync::Arc;
use std::time::Duration;

use bustrack::attendance::{
    AttendanceGate, AttendanceRecord, AttendanceSink, Notification, NotificationSink, Person,
    Roster,
};
use bustrack::backend::{BackendClient, BackendServer, BackendState};
use bustrack::coord::Coordinate;
use bustrack::journey::{JourneyConfig, JourneyEvent, JourneyRunner, JourneyState, JourneyStatus};
use bustrack::publisher::{LocationPublisher, PublisherConfig};
use bustrack::route::StraightLineRouteProvider;
use bustrack::store::{BusId, InMemoryLocationStore, LocationStore};
use bustrack::subscriber::{
    ConnectivityState, LocationSubscriber, SubscriberConfig, SubscriberHandle, SubscriberView,
};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

async fn start_server(temp: &TempDir) -> BackendServer {
    let state = BackendState::new(InMemoryLocationStore::new(), temp.path());
    BackendServer::start("127.0.0.1:0".parse().unwrap(), state)
        .await
        .unwrap()
}

fn client(server: &BackendServer) -> BackendClient {
    BackendClient::new(&server.url(), Duration::from_secs(2)).unwrap()
}

/// Wait (bounded) for a view matching `pred`.
async fn wait_for(
    handle: &mut SubscriberHandle,
    pred: impl Fn(&SubscriberView) -> bool,
) -> SubscriberView {
    tokio::time::timeout(Duration::from_secs(5), async {
        let mut view = handle.view();
        while !pred(&view) {
            view = handle.changed().await.unwrap();
        }
        view
    })
    .await
    .unwrap()
}

fn running_at(cursor: usize) -> JourneyState {
    JourneyState {
        cursor_index: cursor,
        status: JourneyStatus::Running,
        ..Default::default()
    }
}

// ============================================================================
// Location store
// ============================================================================

#[tokio::test]
async fn test_health() {
    let temp = TempDir::new().unwrap();
    let server = start_server(&temp).await;
    client(&server).health().await.unwrap();
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_get_upsert_get() {
    let temp = TempDir::new().unwrap();
    let server = start_server(&temp).await;
    let client = client(&server);
    let bus = BusId::new("1");

    assert_eq!(client.get(&bus).await.unwrap(), None);

    let state = running_at(12);
    client.upsert(&bus, &state).await.unwrap();

    let stored = client.get(&bus).await.unwrap().unwrap();
    assert_eq!(stored.cursor_index, 12);
    assert_eq!(stored.status, JourneyStatus::Running);
    assert_eq!(server.state().store().snapshot(&bus), Some(stored));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_fleet_lists_every_bus() {
    let temp = TempDir::new().unwrap();
    let server = start_server(&temp).await;
    let client = client(&server);

    client.upsert(&BusId::new("2"), &running_at(5)).await.unwrap();
    client.upsert(&BusId::new("1"), &running_at(9)).await.unwrap();

    let fleet = client.fleet().await.unwrap();
    let ids: Vec<String> = fleet.iter().map(|s| s.bus_number.to_string()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(fleet[0].state.cursor_index, 9);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_raw_status_errors() {
    let temp = TempDir::new().unwrap();
    let server = start_server(&temp).await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{}/bus/status?busNumber=42", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Bus not started");

    let response = http
        .post(format!("{}/bus/update", server.url()))
        .json(&serde_json::json!({ "busNumber": "1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Missing bus data");

    server.shutdown().await.unwrap();
}

// ============================================================================
// Logs
// ============================================================================

#[tokio::test]
async fn test_attendance_and_notifications_persist() {
    let temp = TempDir::new().unwrap();
    let server = start_server(&temp).await;
    let client = client(&server);
    let bus = BusId::new("3");

    let mut arjun = Person::new(1, "Arjun");
    arjun.present = true;
    let record = AttendanceRecord::new(bus.clone(), 2, vec![arjun.clone(), Person::new(2, "Kiran")]);
    client.append(&record).await.unwrap();
    client
        .enqueue(&Notification::boarded(bus.clone(), 2, &arjun))
        .await
        .unwrap();

    let logs = server.state().logs();
    let records = logs.read_attendance().await.unwrap();
    assert_eq!(records, vec![record]);
    assert!(logs.attendance_path().starts_with(temp.path()));

    let notifications = logs.read_notifications().await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "Arjun has boarded the bus");

    server.shutdown().await.unwrap();
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_polling_subscriber_over_http() {
    let temp = TempDir::new().unwrap();
    let server = start_server(&temp).await;
    let store = Arc::new(client(&server));
    let bus = BusId::new("1");

    let config = SubscriberConfig {
        poll_interval: Duration::from_millis(50),
        request_timeout: Duration::from_secs(2),
    };
    let mut handle = LocationSubscriber::new(bus.clone(), config).attach_polling(Arc::clone(&store));

    let view = wait_for(&mut handle, |v| v.connectivity == ConnectivityState::WaitingForSource).await;
    assert_eq!(view.journey, None);

    store.upsert(&bus, &running_at(30)).await.unwrap();

    let view = wait_for(&mut handle, |v| v.connectivity.is_online()).await;
    assert_eq!(view.journey.unwrap().cursor_index, 30);
    assert!(view.last_success.is_some());

    handle.detach().await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_short_journey_over_http() {
    let temp = TempDir::new().unwrap();
    let server = start_server(&temp).await;
    let remote = Arc::new(client(&server));
    let bus = BusId::new("1");

    let route = StraightLineRouteProvider::new(12)
        .build(
            Coordinate::new(12.9076, 77.4763).unwrap(),
            Coordinate::new(12.8638, 77.4348).unwrap(),
        )
        .unwrap();
    let roster = Roster::new().with_stop(1, vec![Person::new(1, "Arjun")]);
    let config = JourneyConfig {
        tick_interval: Duration::from_millis(50),
        ..Default::default()
    };

    let publisher = LocationPublisher::start(Arc::clone(&remote), bus.clone(), PublisherConfig::default());
    let mut journey = JourneyRunner::new(config, Arc::new(roster), publisher)
        .start(route)
        .unwrap();
    let mut gate = AttendanceGate::new(
        bus.clone(),
        Arc::clone(&remote),
        Arc::clone(&remote),
        journey.resume_handle(),
    );

    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = journey.next_event().await {
            match event {
                JourneyEvent::Halted(halt) => {
                    gate.open(halt.stop, halt.roster).unwrap();
                    gate.mark_all(true).unwrap();
                    gate.resolve().await.unwrap();
                }
                JourneyEvent::Completed(_) => break,
                JourneyEvent::Failed(e) => panic!("journey failed: {}", e),
                _ => {}
            }
        }
    })
    .await
    .unwrap();
    journey.join().await;

    let stored = remote.get(&bus).await.unwrap().unwrap();
    assert_eq!(stored.status, JourneyStatus::Completed);
    assert_eq!(stored.cursor_index, 11);

    let records = server.state().logs().read_attendance().await.unwrap();
    assert_eq!(records.len(), 3);
    let notifications = server.state().logs().read_notifications().await.unwrap();
    assert_eq!(notifications.len(), 1);

    server.shutdown().await.unwrap();
}
