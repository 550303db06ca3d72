//! Journey simulation.
//!
//! A journey walks a [`Route`](crate::route::Route) one path index per tick,
//! halting at each stop until attendance for that stop is resolved.
//!
//! # Architecture
//!
//! ```text
//! JourneyRunner (spawned task, tokio interval)
//!     │ tick / resume
//!     ▼
//! JourneySimulator (pure state machine)
//!     │ JourneyState
//!     ├──► LocationPublisher ──► LocationStore
//!     ├──► watch channel (local observers)
//!     └──► JourneyEvent stream (halts, near-arrival, completion)
//! ```
//!
//! [`JourneySimulator`] can be driven directly for deterministic tests; the
//! [`JourneyRunner`] adds timing, cancellation and publishing.

mod continuation;
mod error;
mod eta;
mod runner;
mod simulator;
mod state;

pub use continuation::Continuation;
pub use error::JourneyError;
pub use eta::eta_seconds;
pub use runner::{JourneyCommand, JourneyEvent, JourneyHandle, JourneyRunner, ResumeHandle};
pub use simulator::{
    JourneyConfig, JourneySimulator, NearArrival, StopHalt, Tick, TickOutcome,
    DEFAULT_NEAR_ARRIVAL_SECS, DEFAULT_TICK_INTERVAL,
};
pub use state::{EtaTarget, JourneyState, JourneyStatus, ARRIVED_LABEL, FAILED_LABEL};
