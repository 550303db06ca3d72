//! Push strategy: seed with one read, then follow the store's change feed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::poll::{log_outcome, read_once};
use super::view::{ReadOutcome, SubscriberView};
use crate::store::{BusId, LocationStore, StoreChanges};

pub(super) async fn run_push<S: LocationStore + StoreChanges>(
    store: Arc<S>,
    bus_id: BusId,
    request_timeout: Duration,
    view_tx: watch::Sender<SubscriberView>,
    cancel: CancellationToken,
) {
    // Subscribe before the seed read so no change can fall in between.
    let mut changes = store.changes();
    tracing::debug!(bus = %bus_id, "Push subscriber attached");

    let seed = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        outcome = read_once(store.as_ref(), &bus_id, request_timeout) => outcome,
    };
    log_outcome(&bus_id, &seed);
    view_tx.send_modify(|view| view.apply(seed));

    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = changes.recv() => received,
        };

        let outcome = match received {
            Ok(update) if update.bus_number == bus_id => ReadOutcome::Found(update.state),
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(bus = %bus_id, skipped, "Change feed lagged, re-reading");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    outcome = read_once(store.as_ref(), &bus_id, request_timeout) => outcome,
                }
            }
            Err(RecvError::Closed) => {
                tracing::warn!(bus = %bus_id, "Change feed closed");
                view_tx.send_modify(|view| {
                    view.apply(ReadOutcome::Failed("change feed closed".to_string()))
                });
                break;
            }
        };

        log_outcome(&bus_id, &outcome);
        view_tx.send_modify(|view| view.apply(outcome));
    }

    tracing::debug!(bus = %bus_id, "Push subscriber detached");
}
