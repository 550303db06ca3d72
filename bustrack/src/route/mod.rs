//! Route resolution: origin/destination → path + stops.
//!
//! A [`Route`] is produced once per journey and never mutated. Stops are
//! indices into the path, derived from fractional offsets by
//! [`derive_stops`].
//!
//! # Providers
//!
//! - [`OsrmRouteProvider`] - driving geometry from an OSRM server
//! - [`StraightLineRouteProvider`] - offline, evenly spaced straight line

mod error;
mod osrm;
mod provider;
mod stops;
mod types;

pub use error::RouteError;
pub use osrm::{OsrmRouteProvider, DEFAULT_OSRM_URL};
pub use provider::{RouteProvider, StraightLineRouteProvider};
pub use stops::{derive_stops, DEFAULT_STOP_FRACTIONS};
pub use types::{Path, Route, StopMarker, StopSet};
