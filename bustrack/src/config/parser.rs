//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::defaults::{MIN_STRAIGHT_POINTS, MIN_TICK_INTERVAL_MS};
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::attendance::{Person, Roster};
use crate::coord::Coordinate;
use crate::store::BusId;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [route] section
    if let Some(section) = ini.section(Some("route")) {
        if let Some(v) = section.get("provider") {
            config.route.provider = v
                .parse()
                .map_err(|reason| invalid("route", "provider", v, reason))?;
        }
        if let Some(v) = non_empty(section, "osrm_url") {
            config.route.osrm_url = v.to_string();
        }
        if let Some(v) = section.get("origin") {
            config.route.origin = parse_coordinate("route", "origin", v)?;
        }
        if let Some(v) = section.get("destination") {
            config.route.destination = parse_coordinate("route", "destination", v)?;
        }
        if let Some(v) = section.get("stop_fractions") {
            config.route.stop_fractions = parse_fractions(v)?;
        }
        if let Some(v) = section.get("straight_points") {
            let points: usize = parse_number("route", "straight_points", v)?;
            if points < MIN_STRAIGHT_POINTS {
                return Err(invalid(
                    "route",
                    "straight_points",
                    v,
                    format!("must be at least {}", MIN_STRAIGHT_POINTS),
                ));
            }
            config.route.straight_points = points;
        }
    }

    // [journey] section
    if let Some(section) = ini.section(Some("journey")) {
        if let Some(v) = section.get("bus_id") {
            config.journey.bus_id = v
                .parse::<BusId>()
                .map_err(|reason| invalid("journey", "bus_id", v, reason))?;
        }
        if let Some(v) = section.get("tick_interval_ms") {
            let ms: u64 = parse_number("journey", "tick_interval_ms", v)?;
            if ms < MIN_TICK_INTERVAL_MS {
                return Err(invalid(
                    "journey",
                    "tick_interval_ms",
                    v,
                    format!("must be at least {} ms", MIN_TICK_INTERVAL_MS),
                ));
            }
            config.journey.tick_interval_ms = ms;
        }
        if let Some(v) = section.get("near_arrival_secs") {
            config.journey.near_arrival_secs = parse_number("journey", "near_arrival_secs", v)?;
        }
    }

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = non_empty(section, "backend_url") {
            config.store.backend_url = v.to_string();
        }
        if let Some(v) = section.get("publish_timeout_ms") {
            config.store.publish_timeout_ms = parse_positive("store", "publish_timeout_ms", v)?;
        }
    }

    // [subscriber] section
    if let Some(section) = ini.section(Some("subscriber")) {
        if let Some(v) = section.get("strategy") {
            config.subscriber.strategy = v
                .parse()
                .map_err(|reason| invalid("subscriber", "strategy", v, reason))?;
        }
        if let Some(v) = section.get("poll_interval_ms") {
            config.subscriber.poll_interval_ms =
                parse_positive("subscriber", "poll_interval_ms", v)?;
        }
        if let Some(v) = section.get("request_timeout_ms") {
            config.subscriber.request_timeout_ms =
                parse_positive("subscriber", "request_timeout_ms", v)?;
        }
    }

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = non_empty(section, "bind") {
            v.parse::<std::net::SocketAddr>()
                .map_err(|e| invalid("server", "bind", v, e.to_string()))?;
            config.server.bind = v.to_string();
        }
        if let Some(v) = non_empty(section, "data_dir") {
            config.server.data_dir = expand_tilde(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    // [roster] section
    if let Some(section) = ini.section(Some("roster")) {
        config.roster = parse_roster(section)?;
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(section: &str, key: &str, v: &str) -> Result<T, ConfigFileError> {
    v.trim()
        .parse()
        .map_err(|_| invalid(section, key, v, "must be a non-negative integer"))
}

fn parse_positive(section: &str, key: &str, v: &str) -> Result<u64, ConfigFileError> {
    match parse_number::<u64>(section, key, v)? {
        0 => Err(invalid(section, key, v, "must be greater than zero")),
        n => Ok(n),
    }
}

fn parse_coordinate(section: &str, key: &str, v: &str) -> Result<Coordinate, ConfigFileError> {
    v.parse::<Coordinate>()
        .map_err(|e| invalid(section, key, v, e.to_string()))
}

/// Parse `"0.25, 0.5, 0.75"`. An empty value means no stops.
fn parse_fractions(v: &str) -> Result<Vec<f64>, ConfigFileError> {
    let mut fractions = Vec::new();
    for part in v.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let fraction: f64 = part.parse().map_err(|_| {
            invalid("route", "stop_fractions", v, "expected comma-separated numbers")
        })?;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(invalid(
                "route",
                "stop_fractions",
                v,
                "each fraction must be between 0 and 1 (exclusive)",
            ));
        }
        fractions.push(fraction);
    }
    Ok(fractions)
}

/// Parse `[roster]`: `<stop> = <id>:<name>, <id>:<name>`.
fn parse_roster(section: &Properties) -> Result<Roster, ConfigFileError> {
    let mut roster = Roster::new();

    for (key, value) in section.iter() {
        let stop: u32 = key
            .trim()
            .parse()
            .ok()
            .filter(|stop| *stop > 0)
            .ok_or_else(|| invalid("roster", key, value, "key must be a stop number (1, 2, ...)"))?;

        let mut people = Vec::new();
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, name) = entry
                .split_once(':')
                .map(|(id, name)| (id.trim(), name.trim()))
                .filter(|(_, name)| !name.is_empty())
                .ok_or_else(|| invalid("roster", key, value, "expected entries like '1:Arjun'"))?;
            let id: u32 = id
                .parse()
                .map_err(|_| invalid("roster", key, value, format!("'{}' is not a numeric id", id)))?;
            people.push(Person::new(id, name));
        }
        roster.insert(stop, people);
    }

    Ok(roster)
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
