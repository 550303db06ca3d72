//! Common types and utilities shared across CLI commands.

use std::time::Duration;

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::MultiSelect;

use bustrack::attendance::{
    AttendanceGate, AttendanceRecord, AttendanceSink, GateError, NotificationSink, Person,
};
use bustrack::config::{ConfigFile, RouteSettings, RouteSource};
use bustrack::journey::{JourneyEvent, JourneyState, StopHalt};
use bustrack::route::{OsrmRouteProvider, Route, RouteProvider, StraightLineRouteProvider};
use bustrack::store::BusId;
use bustrack::subscriber::SubscriberView;

use crate::error::CliError;

/// How presence is decided when the bus halts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceMode {
    /// Ask the operator with a multi-select prompt.
    Prompt,
    /// Everyone on the roster boarded.
    AllPresent,
}

const MAX_RESOLVE_ATTEMPTS: u32 = 3;
const RESOLVE_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Resolve the bus number: CLI flag first, then config.
pub fn resolve_bus(cli_bus: Option<String>, config: &ConfigFile) -> Result<BusId, CliError> {
    match cli_bus {
        Some(raw) => raw
            .parse::<BusId>()
            .map_err(|e| CliError::Config(format!("Invalid bus number '{}': {}", raw, e))),
        None => Ok(config.journey.bus_id.clone()),
    }
}

/// Build the route described by the `[route]` section.
pub async fn resolve_route(settings: &RouteSettings) -> Result<Route, CliError> {
    let route = match settings.provider {
        RouteSource::Osrm => {
            OsrmRouteProvider::new(settings.osrm_url.clone())?
                .with_stop_fractions(settings.stop_fractions.clone())
                .route(settings.origin, settings.destination)
                .await?
        }
        RouteSource::StraightLine => StraightLineRouteProvider::new(settings.straight_points)
            .with_stop_fractions(settings.stop_fractions.clone())
            .build(settings.origin, settings.destination)?,
    };
    Ok(route)
}

/// One-line route summary.
pub fn describe_route(route: &Route) -> String {
    format!(
        "{:.2} km, {} points, {} stops",
        route.length_meters() / 1000.0,
        route.path().len(),
        route.stops().len()
    )
}

/// One-line journey state summary.
pub fn describe_state(state: &JourneyState) -> String {
    let mut line = format!("{} | {}", state.status, state.eta_label);
    if !state.status.is_terminal() {
        line.push_str(&format!(": {}s", state.eta_seconds));
    }
    if let Some(position) = state.position {
        line.push_str(&format!(" | {}", position));
    }
    line
}

/// One-line observer view summary.
pub fn describe_view(view: &SubscriberView) -> String {
    let connectivity = if view.connectivity.is_online() {
        style(view.connectivity.to_string()).green()
    } else if view.connectivity.is_degraded() {
        style(view.connectivity.to_string()).red()
    } else {
        style(view.connectivity.to_string()).yellow()
    };

    match &view.journey {
        Some(state) => format!("[{}] {}", connectivity, describe_state(state)),
        None => format!("[{}] no journey yet", connectivity),
    }
}

/// Print a journey event for the operator.
pub fn print_event(event: &JourneyEvent) {
    match event {
        JourneyEvent::Started(state) => {
            println!("{} Journey started ({})", style("▶").green(), describe_state(state))
        }
        JourneyEvent::NearArrival(signal) => println!(
            "{} Arriving at {} in {}s",
            style("⚑").yellow(),
            signal.target,
            signal.eta_seconds
        ),
        JourneyEvent::Halted(halt) => println!(
            "{} Halted at Stop {} ({} on roster)",
            style("■").red(),
            halt.stop,
            halt.roster.len()
        ),
        JourneyEvent::Resumed { stop } => {
            println!("{} Leaving Stop {}", style("▶").green(), stop)
        }
        JourneyEvent::Completed(_) => {
            println!("{} Arrived at destination", style("✓").green().bold())
        }
        JourneyEvent::Failed(e) => println!("{} Journey failed: {}", style("✗").red().bold(), e),
        JourneyEvent::Stopped => println!("Journey stopped."),
    }
}

/// Ask which people boarded. Returns roster indices.
fn prompt_attendance(stop: u32, roster: &[Person]) -> Result<Vec<usize>, CliError> {
    let names: Vec<&str> = roster.iter().map(|p| p.name.as_str()).collect();
    MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Stop {}: who boarded? (space toggles, enter confirms)", stop))
        .items(&names)
        .interact()
        .map_err(|e| CliError::Prompt(e.to_string()))
}

/// Open the gate for `halt`, decide presence, and resolve.
///
/// Storage failures are retried a few times; the journey stays halted
/// meanwhile.
pub async fn take_attendance<A: AttendanceSink, N: NotificationSink>(
    gate: &mut AttendanceGate<A, N>,
    halt: StopHalt,
    mode: AttendanceMode,
) -> Result<AttendanceRecord, CliError> {
    let stop = halt.stop;
    let roster = gate.open(stop, halt.roster)?.to_vec();

    match mode {
        AttendanceMode::AllPresent => gate.mark_all(true)?,
        AttendanceMode::Prompt if !roster.is_empty() => {
            let prompt_roster = roster.clone();
            let chosen = tokio::task::spawn_blocking(move || prompt_attendance(stop, &prompt_roster))
                .await
                .map_err(|e| CliError::Prompt(e.to_string()))??;
            for index in chosen {
                if let Some(person) = roster.get(index) {
                    gate.mark(person.id, true)?;
                }
            }
        }
        AttendanceMode::Prompt => {}
    }

    let mut attempt = 1;
    loop {
        match gate.resolve().await {
            Ok(record) => {
                let present: Vec<&str> = record.present().map(|p| p.name.as_str()).collect();
                println!(
                    "  Attendance for Stop {}: {}/{} boarded{}",
                    stop,
                    present.len(),
                    record.roster.len(),
                    if present.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", present.join(", "))
                    }
                );
                return Ok(record);
            }
            Err(GateError::Attendance(e)) if attempt < MAX_RESOLVE_ATTEMPTS => {
                println!(
                    "  {} Could not save attendance ({}), retrying...",
                    style("!").yellow(),
                    e
                );
                attempt += 1;
                tokio::time::sleep(RESOLVE_RETRY_DELAY).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
