//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::attendance::Roster;
use crate::coord::Coordinate;
use crate::journey::{DEFAULT_NEAR_ARRIVAL_SECS, DEFAULT_TICK_INTERVAL};
use crate::publisher::DEFAULT_WRITE_TIMEOUT;
use crate::route::{DEFAULT_OSRM_URL, DEFAULT_STOP_FRACTIONS};
use crate::store::BusId;
use crate::subscriber::{SubscriberStrategy, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT};

// =============================================================================
// Route
// =============================================================================

/// Default journey origin.
pub const DEFAULT_ORIGIN: Coordinate = Coordinate {
    latitude: 12.907609209246655,
    longitude: 77.47634064715605,
};

/// Default journey destination.
pub const DEFAULT_DESTINATION: Coordinate = Coordinate {
    latitude: 12.86377436214521,
    longitude: 77.43479290230692,
};

/// Default number of points for the straight-line provider.
pub const DEFAULT_STRAIGHT_POINTS: usize = 100;

/// Smallest accepted straight-line point count.
pub const MIN_STRAIGHT_POINTS: usize = 2;

// =============================================================================
// Journey / store / subscriber
// =============================================================================

/// Default bus identifier.
pub const DEFAULT_BUS_ID: &str = "1";

/// Smallest accepted tick interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 50;

/// Default backend URL.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:3000";

// =============================================================================
// Server / logging
// =============================================================================

/// Default server bind address.
pub const DEFAULT_SERVER_BIND: &str = crate::backend::DEFAULT_BIND;

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE: &str = "bustrack.log";

/// Default data directory (~/.bustrack/data).
pub fn default_data_dir() -> PathBuf {
    config_directory().join("data")
}

/// Default log file path (~/.bustrack/bustrack.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            route: RouteSettings {
                provider: RouteSource::Osrm,
                osrm_url: DEFAULT_OSRM_URL.to_string(),
                origin: DEFAULT_ORIGIN,
                destination: DEFAULT_DESTINATION,
                stop_fractions: DEFAULT_STOP_FRACTIONS.to_vec(),
                straight_points: DEFAULT_STRAIGHT_POINTS,
            },
            journey: JourneySettings {
                bus_id: BusId::new(DEFAULT_BUS_ID),
                tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
                near_arrival_secs: DEFAULT_NEAR_ARRIVAL_SECS,
            },
            store: StoreSettings {
                backend_url: DEFAULT_BACKEND_URL.to_string(),
                publish_timeout_ms: DEFAULT_WRITE_TIMEOUT.as_millis() as u64,
            },
            subscriber: SubscriberSettings {
                strategy: SubscriberStrategy::Poll,
                poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
                request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            },
            server: ServerSettings {
                bind: DEFAULT_SERVER_BIND.to_string(),
                data_dir: default_data_dir(),
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
            roster: Roster::new(),
        }
    }
}
