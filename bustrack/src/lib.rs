//! BusTrack - school bus journey simulation and live tracking
//!
//! This library simulates a bus driving a fixed route, halting at each stop
//! until the roster for that stop has been checked, and mirrors its position
//! and ETA into a shared store that observers follow in near real time.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use bustrack::journey::{JourneyConfig, JourneyEvent, JourneyRunner};
//! use bustrack::publisher::{LocationPublisher, PublisherConfig};
//! use bustrack::route::{RouteProvider, StraightLineRouteProvider};
//! use bustrack::store::{BusId, InMemoryLocationStore};
//!
//! let store = Arc::new(InMemoryLocationStore::new());
//! let route = StraightLineRouteProvider::new(100).route(origin, destination).await?;
//! let publisher = LocationPublisher::start(store.clone(), BusId::new("1"), PublisherConfig::default());
//!
//! let mut journey = JourneyRunner::new(JourneyConfig::default(), roster, publisher).start(route)?;
//! while let Some(event) = journey.next_event().await {
//!     if let JourneyEvent::Halted(halt) = event {
//!         // open an AttendanceGate, mark presence, resolve
//!     }
//! }
//! ```

pub mod attendance;
pub mod backend;
pub mod config;
pub mod coord;
pub mod journey;
pub mod logging;
pub mod publisher;
pub mod route;
pub mod store;
pub mod subscriber;

/// Version of the BusTrack library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
