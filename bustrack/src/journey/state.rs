//! Journey state types.
//!
//! - [`JourneyStatus`] - where the state machine is
//! - [`EtaTarget`] - what the ETA is counting down to
//! - [`JourneyState`] - the snapshot published to observers

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// Journey state machine status.
///
/// `Idle → Running → HaltedAtStop(k) → Running → … → Completed`.
/// `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JourneyStatus {
    #[default]
    Idle,
    Running,
    HaltedAtStop {
        stop: u32,
    },
    Completed,
}

impl JourneyStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The stop the journey is halted at, if any.
    pub fn halted_stop(&self) -> Option<u32> {
        match self {
            Self::HaltedAtStop { stop } => Some(*stop),
            _ => None,
        }
    }
}

impl fmt::Display for JourneyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::HaltedAtStop { stop } => write!(f, "Halted at Stop {}", stop),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// What an ETA counts down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EtaTarget {
    /// The next unresolved stop, by ordinal.
    Stop(u32),
    /// The end of the path.
    Destination,
}

impl EtaTarget {
    /// Human-readable label published with the ETA.
    pub fn label(&self) -> String {
        match self {
            Self::Stop(k) => format!("ETA to Stop {}", k),
            Self::Destination => "ETA to Destination".to_string(),
        }
    }
}

impl fmt::Display for EtaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop(k) => write!(f, "Stop {}", k),
            Self::Destination => write!(f, "Destination"),
        }
    }
}

/// Label shown once the journey has completed.
pub const ARRIVED_LABEL: &str = "Arrived";

/// Label shown after the journey aborted on an error.
pub const FAILED_LABEL: &str = "Journey failed";

/// Journey snapshot.
///
/// Mutated only by the simulator; everyone else receives clones. The wire
/// form uses camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyState {
    /// Index of the current coordinate in the journey's path.
    pub cursor_index: usize,

    pub status: JourneyStatus,

    /// Seconds until the next stop (or the destination when none remain).
    pub eta_seconds: u64,

    /// What `eta_seconds` refers to, e.g. "ETA to Stop 2".
    pub eta_label: String,

    /// Coordinate at `cursor_index`. `None` before a journey starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinate>,

    /// Ordinal of the stop being approached or halted at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_stop: Option<u32>,

    pub last_updated: DateTime<Utc>,
}

impl Default for JourneyState {
    fn default() -> Self {
        Self {
            cursor_index: 0,
            status: JourneyStatus::Idle,
            eta_seconds: 0,
            eta_label: "ETA".to_string(),
            position: None,
            next_stop: None,
            last_updated: Utc::now(),
        }
    }
}
