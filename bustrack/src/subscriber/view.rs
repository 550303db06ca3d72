//! Subscriber-side view: last known journey state plus link health.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::journey::JourneyState;
use crate::store::StoreError;

/// Observer-side health of the link to the shared store.
///
/// Independent of the journey's own status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ConnectivityState {
    /// Not attached yet.
    #[default]
    Initializing,
    /// Attached, no successful read yet.
    Connecting,
    /// Last read returned a record.
    Online,
    /// Last read succeeded but the bus has not published anything.
    WaitingForSource,
    /// Last read exceeded its time budget.
    TimedOut,
    /// Last read failed for any other reason.
    Error(String),
}

impl ConnectivityState {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityState::Online)
    }

    /// True for states that mean the displayed journey may be stale.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            ConnectivityState::TimedOut | ConnectivityState::Error(_)
        )
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityState::Initializing => write!(f, "Init..."),
            ConnectivityState::Connecting => write!(f, "Connecting..."),
            ConnectivityState::Online => write!(f, "Online"),
            ConnectivityState::WaitingForSource => write!(f, "Waiting for Bus..."),
            ConnectivityState::TimedOut => write!(f, "Timeout"),
            ConnectivityState::Error(detail) => write!(f, "Error: {}", detail),
        }
    }
}

/// Result of one read against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Found(JourneyState),
    Absent,
    TimedOut,
    Failed(String),
}

impl From<Result<Option<JourneyState>, StoreError>> for ReadOutcome {
    fn from(result: Result<Option<JourneyState>, StoreError>) -> Self {
        match result {
            Ok(Some(state)) => ReadOutcome::Found(state),
            Ok(None) => ReadOutcome::Absent,
            Err(StoreError::Timeout(_)) => ReadOutcome::TimedOut,
            Err(e) => ReadOutcome::Failed(e.to_string()),
        }
    }
}

/// Local projection of one bus's remote state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberView {
    /// Last journey state successfully read. Kept through failed reads.
    pub journey: Option<JourneyState>,

    pub connectivity: ConnectivityState,

    /// When the last successful read completed.
    pub last_success: Option<DateTime<Utc>>,
}

impl SubscriberView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the view as attached and awaiting its first read.
    pub fn connecting(&mut self) {
        self.connectivity = ConnectivityState::Connecting;
    }

    /// Fold one read outcome into the view.
    pub fn apply(&mut self, outcome: ReadOutcome) {
        match outcome {
            ReadOutcome::Found(state) => {
                self.journey = Some(state);
                self.connectivity = ConnectivityState::Online;
                self.last_success = Some(Utc::now());
            }
            ReadOutcome::Absent => {
                self.connectivity = ConnectivityState::WaitingForSource;
                self.last_success = Some(Utc::now());
            }
            ReadOutcome::TimedOut => {
                self.connectivity = ConnectivityState::TimedOut;
            }
            ReadOutcome::Failed(detail) => {
                self.connectivity = ConnectivityState::Error(detail);
            }
        }
    }
}
