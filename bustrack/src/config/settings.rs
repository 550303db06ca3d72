//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are plain data types; parsing lives in [`super::parser`] and
//! serialization in [`super::writer`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::attendance::Roster;
use crate::coord::Coordinate;
use crate::journey::JourneyConfig;
use crate::publisher::PublisherConfig;
use crate::store::BusId;
use crate::subscriber::{SubscriberConfig, SubscriberStrategy};

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Route resolution
    pub route: RouteSettings,
    /// Journey timing and identity
    pub journey: JourneySettings,
    /// Shared store connection
    pub store: StoreSettings,
    /// Observer settings
    pub subscriber: SubscriberSettings,
    /// Backend server settings
    pub server: ServerSettings,
    /// Logging settings
    pub logging: LoggingSettings,
    /// Stop ordinal → expected riders
    pub roster: Roster,
}

/// Where route geometry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// OSRM routing service
    Osrm,
    /// Offline straight line between origin and destination
    StraightLine,
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSource::Osrm => write!(f, "osrm"),
            RouteSource::StraightLine => write!(f, "straight"),
        }
    }
}

impl FromStr for RouteSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "osrm" => Ok(RouteSource::Osrm),
            "straight" | "straight_line" | "offline" => Ok(RouteSource::StraightLine),
            other => Err(format!("unknown route provider '{}'", other)),
        }
    }
}

/// Route configuration.
#[derive(Debug, Clone)]
pub struct RouteSettings {
    pub provider: RouteSource,
    /// OSRM base URL
    pub osrm_url: String,
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Fractions of the path length at which stops are placed
    pub stop_fractions: Vec<f64>,
    /// Number of points for the straight-line provider
    pub straight_points: usize,
}

/// Journey configuration.
#[derive(Debug, Clone)]
pub struct JourneySettings {
    /// Bus identifier published with every update
    pub bus_id: BusId,
    /// Milliseconds per tick
    pub tick_interval_ms: u64,
    /// Near-arrival threshold in seconds
    pub near_arrival_secs: u64,
}

impl JourneySettings {
    pub fn to_journey_config(&self) -> JourneyConfig {
        JourneyConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            near_arrival_secs: self.near_arrival_secs,
        }
    }
}

/// Shared store configuration.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Backend base URL
    pub backend_url: String,
    /// Per-write budget in milliseconds
    pub publish_timeout_ms: u64,
}

impl StoreSettings {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn to_publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            write_timeout: self.publish_timeout(),
        }
    }
}

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct SubscriberSettings {
    pub strategy: SubscriberStrategy,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl SubscriberSettings {
    pub fn to_subscriber_config(&self) -> SubscriberConfig {
        SubscriberConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Listen address, e.g. `0.0.0.0:3000`
    pub bind: String,
    /// Directory for attendance.json / notifications.json
    pub data_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
