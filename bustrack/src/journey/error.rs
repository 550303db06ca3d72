//! Error types for the journey simulator and runner.

use thiserror::Error;

use super::state::JourneyStatus;

/// Errors raised by the journey state machine.
///
/// All of these are fatal to the journey instance that raised them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JourneyError {
    /// `start` was called on a simulator that already ran.
    #[error("Journey already started (status: {0})")]
    AlreadyStarted(JourneyStatus),

    /// The configured tick interval cannot drive a timer.
    #[error("Tick interval must be greater than zero")]
    ZeroTickInterval,

    /// `resume` was called while not halted at the given stop.
    #[error("Cannot resume stop {stop} while {status}")]
    NotHaltedAt { stop: u32, status: JourneyStatus },

    /// The cursor left the path.
    #[error("Cursor {cursor} outside path of {len} points")]
    CursorOutOfRange { cursor: usize, len: usize },

    /// The background runner has stopped; commands can no longer be delivered.
    #[error("Journey runner has stopped")]
    RunnerStopped,
}
