//! Journey simulator - the tick-driven state machine.
//!
//! The simulator is a plain, synchronous state machine: every call to
//! [`JourneySimulator::tick`] advances the cursor by one path index and
//! reports what happened. It owns no timers. [`super::JourneyRunner`] drives
//! it from a `tokio` interval; tests drive it directly.
//!
//! # Tick semantics
//!
//! While `Running`, each tick:
//! 1. completes the journey if the cursor is already on the last index;
//! 2. otherwise advances the cursor and recomputes the ETA to the next stop
//!    (or to the destination when no stops remain);
//! 3. raises a near-arrival signal the first time that ETA drops to the
//!    threshold for a given target;
//! 4. halts if the cursor is now on the next stop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::continuation::Continuation;
use super::error::JourneyError;
use super::eta::eta_seconds;
use super::state::{EtaTarget, JourneyState, JourneyStatus, ARRIVED_LABEL, FAILED_LABEL};
use crate::attendance::{Person, Roster};
use crate::route::Route;

/// Default tick interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Default near-arrival threshold in seconds.
pub const DEFAULT_NEAR_ARRIVAL_SECS: u64 = 8;

/// Journey timing configuration.
#[derive(Debug, Clone)]
pub struct JourneyConfig {
    /// Time represented by one tick (one path index).
    pub tick_interval: Duration,

    /// ETA at or below which the near-arrival signal fires.
    pub near_arrival_secs: u64,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            near_arrival_secs: DEFAULT_NEAR_ARRIVAL_SECS,
        }
    }
}

/// Raised once per target when its ETA first drops to the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearArrival {
    pub target: EtaTarget,
    pub eta_seconds: u64,
}

/// The journey stopped at a stop and waits for attendance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopHalt {
    /// Stop ordinal.
    pub stop: u32,

    /// Absolute path index of the stop.
    pub halt_index: usize,

    /// Roster for this stop, presence flags cleared.
    pub roster: Vec<Person>,

    /// Number of path points after the halt point.
    pub remaining_points: usize,
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Cursor advanced by one.
    Advanced,
    /// Cursor advanced onto a stop; ticking must stop until resumed.
    Halted(StopHalt),
    /// The final index had been reached; the journey is over.
    Completed,
    /// The simulator was not running; nothing changed.
    Inactive(JourneyStatus),
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub outcome: TickOutcome,
    pub near_arrival: Option<NearArrival>,
}

impl Tick {
    fn inactive(status: JourneyStatus) -> Self {
        Self {
            outcome: TickOutcome::Inactive(status),
            near_arrival: None,
        }
    }

    /// True if the runner should stop scheduling ticks after this one.
    pub fn stops_ticking(&self) -> bool {
        !matches!(self.outcome, TickOutcome::Advanced)
    }
}

/// Per-journey data, present from `start` on.
struct ActiveJourney {
    route: Route,

    /// Remainder currently being traversed.
    segment: Continuation,

    /// Remainder snapshotted at the current halt.
    suspended: Option<Continuation>,

    /// Targets that already raised a near-arrival signal.
    notified: HashSet<EtaTarget>,
}

/// Journey simulator.
pub struct JourneySimulator {
    config: JourneyConfig,
    roster: Arc<Roster>,
    journey: Option<ActiveJourney>,
    state: JourneyState,
}

impl JourneySimulator {
    /// Create an idle simulator.
    pub fn new(config: JourneyConfig, roster: Arc<Roster>) -> Self {
        Self {
            config,
            roster,
            journey: None,
            state: JourneyState::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &JourneyState {
        &self.state
    }

    pub fn status(&self) -> JourneyStatus {
        self.state.status
    }

    pub fn config(&self) -> &JourneyConfig {
        &self.config
    }

    /// The route of the current journey, if started.
    pub fn route(&self) -> Option<&Route> {
        self.journey.as_ref().map(|j| &j.route)
    }

    /// The remainder snapshotted at the current halt, if halted.
    pub fn suspended(&self) -> Option<&Continuation> {
        self.journey.as_ref().and_then(|j| j.suspended.as_ref())
    }

    /// `Idle → Running`: capture the route and put the cursor on index 0.
    pub fn start(&mut self, route: Route) -> Result<(), JourneyError> {
        if self.state.status != JourneyStatus::Idle {
            return Err(JourneyError::AlreadyStarted(self.state.status));
        }
        if self.config.tick_interval.is_zero() {
            return Err(JourneyError::ZeroTickInterval);
        }

        let segment = Continuation::from_start(route.stops());
        self.journey = Some(ActiveJourney {
            route,
            segment,
            suspended: None,
            notified: HashSet::new(),
        });

        self.state.cursor_index = 0;
        self.state.status = JourneyStatus::Running;
        self.refresh_eta()?;

        tracing::debug!(
            points = self.route().map(|r| r.path().len()).unwrap_or(0),
            stops = self.route().map(|r| r.stops().len()).unwrap_or(0),
            "Journey started"
        );
        Ok(())
    }

    /// Abandon the journey after an error.
    ///
    /// The status is left as is; the label tells readers no further
    /// movement is coming and later ticks are no-ops.
    pub fn fail(&mut self) {
        self.journey = None;
        self.state.eta_label = FAILED_LABEL.to_string();
        self.state.eta_seconds = 0;
        self.state.last_updated = Utc::now();
    }

    /// Advance the journey by one tick.
    pub fn tick(&mut self) -> Result<Tick, JourneyError> {
        if !self.state.status.is_running() {
            return Ok(Tick::inactive(self.state.status));
        }
        let Some(journey) = self.journey.as_mut() else {
            return Ok(Tick::inactive(self.state.status));
        };

        let path = journey.route.path();
        let last_index = path.last_index();

        if self.state.cursor_index >= last_index {
            self.state.cursor_index = last_index;
            self.state.position = Some(path[last_index]);
            self.state.status = JourneyStatus::Completed;
            self.state.eta_seconds = 0;
            self.state.eta_label = ARRIVED_LABEL.to_string();
            self.state.next_stop = None;
            self.state.last_updated = Utc::now();
            return Ok(Tick {
                outcome: TickOutcome::Completed,
                near_arrival: None,
            });
        }

        let cursor = self.state.cursor_index + 1;
        let position = *path.get(cursor).ok_or(JourneyError::CursorOutOfRange {
            cursor,
            len: path.len(),
        })?;

        let next_stop = journey.segment.next_stop();
        let (target_index, target) = match next_stop {
            Some(stop) => (stop.index, EtaTarget::Stop(stop.ordinal)),
            None => (path.len(), EtaTarget::Destination),
        };
        let eta = eta_seconds(target_index, cursor, self.config.tick_interval);

        self.state.cursor_index = cursor;
        self.state.position = Some(position);
        self.state.eta_seconds = eta;
        self.state.eta_label = target.label();
        self.state.next_stop = next_stop.map(|s| s.ordinal);
        self.state.last_updated = Utc::now();

        let near_arrival = if eta <= self.config.near_arrival_secs && journey.notified.insert(target)
        {
            Some(NearArrival {
                target,
                eta_seconds: eta,
            })
        } else {
            None
        };

        let outcome = match next_stop {
            Some(stop) if stop.index == cursor => {
                let suspended = journey.segment.after_halt(cursor);
                let remaining_points = suspended.remaining_path(path).len();
                journey.suspended = Some(suspended);
                self.state.status = JourneyStatus::HaltedAtStop { stop: stop.ordinal };

                TickOutcome::Halted(StopHalt {
                    stop: stop.ordinal,
                    halt_index: cursor,
                    roster: self.roster.for_stop(stop.ordinal),
                    remaining_points,
                })
            }
            _ => TickOutcome::Advanced,
        };

        Ok(Tick {
            outcome,
            near_arrival,
        })
    }

    /// `HaltedAtStop(k) → Running`, continuing with the snapshotted remainder.
    pub fn resume(&mut self, stop: u32) -> Result<(), JourneyError> {
        let status = self.state.status;
        if status.halted_stop() != Some(stop) {
            return Err(JourneyError::NotHaltedAt { stop, status });
        }
        let Some(suspended) = self.journey.as_mut().and_then(|j| j.suspended.take()) else {
            return Err(JourneyError::NotHaltedAt { stop, status });
        };

        if let Some(journey) = self.journey.as_mut() {
            journey.segment = suspended;
        }
        self.state.status = JourneyStatus::Running;
        self.refresh_eta()?;
        Ok(())
    }

    /// Recompute ETA, label and position for the current cursor without moving.
    fn refresh_eta(&mut self) -> Result<(), JourneyError> {
        let Some(journey) = self.journey.as_ref() else {
            return Ok(());
        };
        let path = journey.route.path();
        let cursor = self.state.cursor_index;
        let position = *path.get(cursor).ok_or(JourneyError::CursorOutOfRange {
            cursor,
            len: path.len(),
        })?;

        let next_stop = journey.segment.next_stop();
        let (target_index, target) = match next_stop {
            Some(stop) => (stop.index, EtaTarget::Stop(stop.ordinal)),
            None => (path.len(), EtaTarget::Destination),
        };

        self.state.position = Some(position);
        self.state.eta_seconds = eta_seconds(target_index, cursor, self.config.tick_interval);
        self.state.eta_label = target.label();
        self.state.next_stop = next_stop.map(|s| s.ordinal);
        self.state.last_updated = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::route::{Path, StopMarker, DEFAULT_STOP_FRACTIONS};

    fn straight_path(len: usize) -> Path {
        Path::new(
            (0..len)
                .map(|i| Coordinate {
                    latitude: 12.9 - i as f64 * 0.0001,
                    longitude: 77.47 - i as f64 * 0.0001,
                })
                .collect(),
        )
        .unwrap()
    }

    fn roster() -> Arc<Roster> {
        Arc::new(
            Roster::new()
                .with_stop(1, vec![Person::new(1, "Arjun"), Person::new(2, "Kiran")])
                .with_stop(2, vec![Person::new(5, "Meera")]),
        )
    }

    fn started(len: usize) -> JourneySimulator {
        let mut sim = JourneySimulator::new(JourneyConfig::default(), roster());
        sim.start(Route::with_fractions(straight_path(len), &DEFAULT_STOP_FRACTIONS))
            .unwrap();
        sim
    }

    /// Tick until the simulator stops ticking; returns the number of ticks.
    fn run_until_stop(sim: &mut JourneySimulator) -> (usize, Tick) {
        let mut ticks = 0;
        loop {
            let tick = sim.tick().unwrap();
            ticks += 1;
            if tick.stops_ticking() {
                return (ticks, tick);
            }
        }
    }

    #[test]
    fn test_start_puts_cursor_on_origin() {
        let sim = started(100);
        let state = sim.state();

        assert_eq!(state.status, JourneyStatus::Running);
        assert_eq!(state.cursor_index, 0);
        assert_eq!(state.eta_seconds, 25);
        assert_eq!(state.eta_label, "ETA to Stop 1");
        assert_eq!(state.next_stop, Some(1));
        assert_eq!(state.position, Some(sim.route().unwrap().path()[0]));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut sim = started(10);
        let again = sim.start(Route::with_fractions(straight_path(10), &[]));
        assert_eq!(
            again,
            Err(JourneyError::AlreadyStarted(JourneyStatus::Running))
        );
    }

    #[test]
    fn test_tick_before_start_is_inactive() {
        let mut sim = JourneySimulator::new(JourneyConfig::default(), roster());
        let tick = sim.tick().unwrap();
        assert_eq!(tick.outcome, TickOutcome::Inactive(JourneyStatus::Idle));
        assert_eq!(sim.state().cursor_index, 0);
    }

    #[test]
    fn test_cursor_advances_exactly_one_per_tick() {
        let mut sim = started(100);
        for expected in 1..25 {
            let tick = sim.tick().unwrap();
            assert_eq!(tick.outcome, TickOutcome::Advanced);
            assert_eq!(sim.state().cursor_index, expected);
        }
    }

    #[test]
    fn test_halts_at_first_stop_after_25_ticks() {
        let mut sim = started(100);
        let (ticks, tick) = run_until_stop(&mut sim);

        assert_eq!(ticks, 25);
        assert_eq!(sim.status(), JourneyStatus::HaltedAtStop { stop: 1 });
        match tick.outcome {
            TickOutcome::Halted(halt) => {
                assert_eq!(halt.stop, 1);
                assert_eq!(halt.halt_index, 25);
                assert_eq!(halt.roster, roster().for_stop(1));
                assert_eq!(halt.remaining_points + halt.halt_index + 1, 100);
            }
            other => panic!("expected halt, got {:?}", other),
        }
        assert_eq!(sim.state().eta_seconds, 0);
    }

    #[test]
    fn test_halted_simulator_ignores_ticks() {
        let mut sim = started(100);
        run_until_stop(&mut sim);

        let tick = sim.tick().unwrap();
        assert_eq!(
            tick.outcome,
            TickOutcome::Inactive(JourneyStatus::HaltedAtStop { stop: 1 })
        );
        assert_eq!(sim.state().cursor_index, 25);
    }

    #[test]
    fn test_resume_continues_to_next_stop() {
        let mut sim = started(100);
        run_until_stop(&mut sim);

        sim.resume(1).unwrap();
        assert_eq!(sim.status(), JourneyStatus::Running);
        assert_eq!(sim.state().eta_label, "ETA to Stop 2");
        assert_eq!(sim.state().eta_seconds, 25);

        let (ticks, _) = run_until_stop(&mut sim);
        assert_eq!(ticks, 25);
        assert_eq!(sim.status(), JourneyStatus::HaltedAtStop { stop: 2 });
        assert_eq!(sim.state().cursor_index, 50);
    }

    #[test]
    fn test_resume_wrong_stop_is_rejected() {
        let mut sim = started(100);
        run_until_stop(&mut sim);

        let err = sim.resume(2).unwrap_err();
        assert_eq!(
            err,
            JourneyError::NotHaltedAt {
                stop: 2,
                status: JourneyStatus::HaltedAtStop { stop: 1 }
            }
        );
    }

    #[test]
    fn test_resume_while_running_is_rejected() {
        let mut sim = started(100);
        assert!(matches!(
            sim.resume(1),
            Err(JourneyError::NotHaltedAt { .. })
        ));
    }

    #[test]
    fn test_full_journey_completes_once() {
        let mut sim = started(100);
        let mut halts = Vec::new();
        let mut total_ticks = 0;

        loop {
            let (ticks, tick) = run_until_stop(&mut sim);
            total_ticks += ticks;
            match tick.outcome {
                TickOutcome::Halted(halt) => {
                    halts.push(halt.stop);
                    sim.resume(halt.stop).unwrap();
                }
                TickOutcome::Completed => break,
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        assert_eq!(halts, vec![1, 2, 3]);
        // 99 advances + the completing tick
        assert_eq!(total_ticks, 100);
        let state = sim.state();
        assert_eq!(state.status, JourneyStatus::Completed);
        assert_eq!(state.eta_seconds, 0);
        assert_eq!(state.cursor_index, 99);
        assert_eq!(state.eta_label, ARRIVED_LABEL);

        // Terminal: further ticks change nothing
        let tick = sim.tick().unwrap();
        assert_eq!(tick.outcome, TickOutcome::Inactive(JourneyStatus::Completed));
        assert_eq!(sim.state().cursor_index, 99);
    }

    #[test]
    fn test_eta_is_non_increasing_between_stop_events() {
        let mut sim = started(100);
        let mut previous = sim.state().eta_seconds;
        loop {
            let tick = sim.tick().unwrap();
            let eta = sim.state().eta_seconds;
            assert!(eta <= previous, "eta rose from {} to {}", previous, eta);
            previous = eta;
            if tick.stops_ticking() {
                break;
            }
        }
    }

    #[test]
    fn test_near_arrival_fires_once_per_stop() {
        let mut sim = started(100);
        let mut signals = Vec::new();

        loop {
            let tick = sim.tick().unwrap();
            if let Some(signal) = tick.near_arrival.clone() {
                signals.push((sim.state().cursor_index, signal));
            }
            match tick.outcome {
                TickOutcome::Halted(halt) => sim.resume(halt.stop).unwrap(),
                TickOutcome::Completed => break,
                _ => {}
            }
        }

        let targets: Vec<EtaTarget> = signals.iter().map(|(_, s)| s.target).collect();
        assert_eq!(
            targets,
            vec![
                EtaTarget::Stop(1),
                EtaTarget::Stop(2),
                EtaTarget::Stop(3),
                EtaTarget::Destination
            ]
        );
        // Fires on the first tick whose ETA is ≤ 8s
        assert_eq!(signals[0].0, 17);
        assert_eq!(signals[0].1.eta_seconds, 8);
        assert_eq!(signals[1].0, 42);
        // Destination target is path length (100): 100 - 92 = 8
        assert_eq!(signals[3].0, 92);
    }

    #[test]
    fn test_empty_stop_set_targets_destination() {
        let mut sim = JourneySimulator::new(JourneyConfig::default(), roster());
        sim.start(Route::with_fractions(straight_path(10), &[])).unwrap();
        assert_eq!(sim.state().eta_label, "ETA to Destination");
        assert_eq!(sim.state().eta_seconds, 10);
        assert_eq!(sim.state().next_stop, None);

        let (ticks, tick) = run_until_stop(&mut sim);
        assert_eq!(tick.outcome, TickOutcome::Completed);
        assert_eq!(ticks, 10);
    }

    #[test]
    fn test_stop_on_last_index_halts_then_completes() {
        let path = straight_path(5);
        let route = Route::new(path, vec![StopMarker { ordinal: 1, index: 4 }]).unwrap();
        let mut sim = JourneySimulator::new(JourneyConfig::default(), roster());
        sim.start(route).unwrap();

        let (ticks, tick) = run_until_stop(&mut sim);
        assert_eq!(ticks, 4);
        match tick.outcome {
            TickOutcome::Halted(halt) => assert_eq!(halt.remaining_points, 0),
            other => panic!("expected halt, got {:?}", other),
        }

        sim.resume(1).unwrap();
        assert_eq!(sim.state().eta_label, "ETA to Destination");
        assert_eq!(sim.state().eta_seconds, 1);
        let tick = sim.tick().unwrap();
        assert_eq!(tick.outcome, TickOutcome::Completed);
    }

    #[test]
    fn test_half_second_ticks_scale_eta() {
        let config = JourneyConfig {
            tick_interval: Duration::from_millis(500),
            near_arrival_secs: 8,
        };
        let mut sim = JourneySimulator::new(config, roster());
        sim.start(Route::with_fractions(straight_path(100), &DEFAULT_STOP_FRACTIONS))
            .unwrap();
        // 25 ticks × 0.5s
        assert_eq!(sim.state().eta_seconds, 13);

        sim.tick().unwrap();
        assert_eq!(sim.state().eta_seconds, 12);
    }

    #[test]
    fn test_unknown_stop_has_empty_roster() {
        let mut sim = JourneySimulator::new(JourneyConfig::default(), Arc::new(Roster::new()));
        sim.start(Route::with_fractions(straight_path(100), &DEFAULT_STOP_FRACTIONS))
            .unwrap();
        let (_, tick) = run_until_stop(&mut sim);
        match tick.outcome {
            TickOutcome::Halted(halt) => assert!(halt.roster.is_empty()),
            other => panic!("expected halt, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_tick_interval_rejected_before_start() {
        let config = JourneyConfig {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        let mut sim = JourneySimulator::new(config, roster());
        let err = sim
            .start(Route::with_fractions(straight_path(100), &DEFAULT_STOP_FRACTIONS))
            .unwrap_err();

        assert_eq!(err, JourneyError::ZeroTickInterval);
        assert_eq!(sim.state().status, JourneyStatus::Idle);
        assert!(sim.route().is_none());
    }

    #[test]
    fn test_fail_marks_state_terminal() {
        let mut sim = started(100);
        sim.tick().unwrap();

        sim.fail();
        let state = sim.state().clone();
        assert_eq!(state.eta_label, FAILED_LABEL);
        assert_eq!(state.eta_seconds, 0);
        assert_eq!(state.cursor_index, 1);

        // Ticks after a failure do not move the bus
        let tick = sim.tick().unwrap();
        assert!(tick.stops_ticking());
        assert_eq!(sim.state().cursor_index, 1);
    }
}
