//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;
use crate::attendance::Roster;
use crate::coord::Coordinate;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let stop_fractions = config
        .route
        .stop_fractions
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"[route]
; Route geometry source:
;   osrm     - OSRM routing service (road-following path)
;   straight - offline straight line between origin and destination
provider = {}
; OSRM base URL (only used when provider = osrm)
osrm_url = {}
; Start and end of the journey as "latitude,longitude"
origin = {}
destination = {}
; Stops are placed at these fractions of the path length (empty = no stops)
stop_fractions = {}
; Number of points on the straight-line path (minimum 2)
straight_points = {}

[journey]
; Identifier published with every location update
bus_id = {}
; Simulated time per path point in milliseconds (default: 1000)
tick_interval_ms = {}
; Raise the "arriving soon" signal once the ETA drops to this many seconds (default: 8)
near_arrival_secs = {}

[store]
; Backend that holds bus locations and attendance logs
backend_url = {}
; Give up on a single location write after this many milliseconds (default: 5000)
publish_timeout_ms = {}

[subscriber]
; How observers follow a bus: poll or push (push needs an in-process store)
strategy = {}
; Milliseconds between polls (default: 2000)
poll_interval_ms = {}
; Per-read time budget in milliseconds (default: 5000)
request_timeout_ms = {}

[server]
; Listen address for `bustrack serve`
bind = {}
; Directory for attendance.json and notifications.json
data_dir = {}

[logging]
; Log file path (truncated at the start of each session)
file = {}

[roster]
; Riders expected at each stop: <stop> = <id>:<name>, <id>:<name>
; Example:
;   1 = 1:Arjun, 2:Kiran
;   2 = 5:Meera
{}"#,
        config.route.provider,
        config.route.osrm_url,
        coordinate_to_string(&config.route.origin),
        coordinate_to_string(&config.route.destination),
        stop_fractions,
        config.route.straight_points,
        config.journey.bus_id,
        config.journey.tick_interval_ms,
        config.journey.near_arrival_secs,
        config.store.backend_url,
        config.store.publish_timeout_ms,
        config.subscriber.strategy,
        config.subscriber.poll_interval_ms,
        config.subscriber.request_timeout_ms,
        config.server.bind,
        path_to_string(&config.server.data_dir),
        path_to_string(&config.logging.file),
        roster_to_string(&config.roster),
    )
}

/// Full precision, unlike `Coordinate`'s display form.
fn coordinate_to_string(c: &Coordinate) -> String {
    format!("{},{}", c.latitude, c.longitude)
}

fn roster_to_string(roster: &Roster) -> String {
    let mut out = String::new();
    for (stop, people) in roster.iter() {
        let entries = people
            .iter()
            .map(|p| format!("{}:{}", p.id, p.name))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("{} = {}\n", stop, entries));
    }
    out
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
