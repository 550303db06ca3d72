//! Polling strategy: read the store on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::view::{ReadOutcome, SubscriberView};
use crate::store::{BusId, LocationStore, StoreError};

/// One bounded read.
pub(super) async fn read_once<S: LocationStore>(
    store: &S,
    bus_id: &BusId,
    budget: Duration,
) -> ReadOutcome {
    let result = match tokio::time::timeout(budget, store.get(bus_id)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::timeout(budget)),
    };
    ReadOutcome::from(result)
}

pub(super) async fn run_polling<S: LocationStore>(
    store: Arc<S>,
    bus_id: BusId,
    poll_interval: Duration,
    request_timeout: Duration,
    view_tx: watch::Sender<SubscriberView>,
    cancel: CancellationToken,
) {
    tracing::debug!(
        bus = %bus_id,
        poll_ms = poll_interval.as_millis() as u64,
        timeout_ms = request_timeout.as_millis() as u64,
        "Polling subscriber attached"
    );

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = read_once(store.as_ref(), &bus_id, request_timeout) => outcome,
        };

        log_outcome(&bus_id, &outcome);
        view_tx.send_modify(|view| view.apply(outcome));
    }

    tracing::debug!(bus = %bus_id, "Polling subscriber detached");
}

pub(super) fn log_outcome(bus_id: &BusId, outcome: &ReadOutcome) {
    match outcome {
        ReadOutcome::Found(state) => {
            tracing::trace!(bus = %bus_id, cursor = state.cursor_index, "Subscriber read")
        }
        ReadOutcome::Absent => tracing::trace!(bus = %bus_id, "Bus not started"),
        ReadOutcome::TimedOut => tracing::debug!(bus = %bus_id, "Subscriber read timed out"),
        ReadOutcome::Failed(detail) => {
            tracing::debug!(bus = %bus_id, error = %detail, "Subscriber read failed")
        }
    }
}
