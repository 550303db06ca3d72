//! Journey runner - drives a [`JourneySimulator`] on a timer.
//!
//! The runner owns the simulator inside a spawned task. While running it
//! ticks on a `tokio` interval; on a halt it drops the interval and waits
//! for a resume command, so no tick is ever scheduled while halted.
//!
//! Every state change is
//! - handed to the [`LocationPublisher`] (fire-and-forget),
//! - stored in a `watch` channel for local observers,
//! - and, for discrete transitions, sent as a [`JourneyEvent`].
//!
//! # Shutdown
//!
//! The task ends when the journey completes, fails, or the handle's
//! cancellation token fires (explicit [`JourneyHandle::stop`] or drop).
//! The publisher is shut down last so the final state reaches the store.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::error::JourneyError;
use super::simulator::{JourneyConfig, JourneySimulator, NearArrival, StopHalt, TickOutcome};
use super::state::JourneyState;
use crate::attendance::Roster;
use crate::publisher::LocationPublisher;
use crate::route::Route;

/// Discrete journey transitions, in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum JourneyEvent {
    Started(JourneyState),
    NearArrival(NearArrival),
    Halted(StopHalt),
    Resumed { stop: u32 },
    Completed(JourneyState),
    Failed(JourneyError),
    /// Cancelled before completion.
    Stopped,
}

/// Commands accepted by a running journey.
#[derive(Debug)]
pub enum JourneyCommand {
    Resume {
        stop: u32,
        reply: oneshot::Sender<Result<(), JourneyError>>,
    },
}

/// Cloneable capability to resume a halted journey.
#[derive(Debug, Clone)]
pub struct ResumeHandle {
    tx: mpsc::UnboundedSender<JourneyCommand>,
}

impl ResumeHandle {
    /// Create a handle together with the receiving end of its commands.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JourneyCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Resume the journey halted at `stop`.
    pub async fn resume(&self, stop: u32) -> Result<(), JourneyError> {
        let (reply, reply_rx) = oneshot::channel();
        self.tx
            .send(JourneyCommand::Resume { stop, reply })
            .map_err(|_| JourneyError::RunnerStopped)?;
        reply_rx.await.map_err(|_| JourneyError::RunnerStopped)?
    }
}

/// Builder for a timer-driven journey.
pub struct JourneyRunner {
    config: JourneyConfig,
    roster: Arc<Roster>,
    publisher: LocationPublisher,
}

impl JourneyRunner {
    pub fn new(config: JourneyConfig, roster: Arc<Roster>, publisher: LocationPublisher) -> Self {
        Self {
            config,
            roster,
            publisher,
        }
    }

    /// Start the journey on `route` and spawn the driving task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self, route: Route) -> Result<JourneyHandle, JourneyError> {
        let mut simulator = JourneySimulator::new(self.config, self.roster);
        simulator.start(route)?;

        let (state_tx, state_rx) = watch::channel(simulator.state().clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (resume, commands) = ResumeHandle::channel();
        let cancel = CancellationToken::new();

        let task = RunnerTask {
            simulator,
            publisher: self.publisher,
            state_tx,
            events_tx,
            commands,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(task.run());

        Ok(JourneyHandle {
            state_rx,
            events_rx,
            resume,
            cancel,
            task: Some(task),
        })
    }
}

/// Owner-side handle of a running journey.
///
/// Dropping the handle stops the journey.
pub struct JourneyHandle {
    state_rx: watch::Receiver<JourneyState>,
    events_rx: mpsc::UnboundedReceiver<JourneyEvent>,
    resume: ResumeHandle,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl JourneyHandle {
    /// Latest journey state.
    pub fn state(&self) -> JourneyState {
        self.state_rx.borrow().clone()
    }

    /// A receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<JourneyState> {
        self.state_rx.clone()
    }

    /// Next journey event; `None` once the journey task has ended and all
    /// events were consumed.
    pub async fn next_event(&mut self) -> Option<JourneyEvent> {
        self.events_rx.recv().await
    }

    pub fn resume_handle(&self) -> ResumeHandle {
        self.resume.clone()
    }

    pub async fn resume(&self, stop: u32) -> Result<(), JourneyError> {
        self.resume.resume(stop).await
    }

    /// Request cancellation. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the journey task to end.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Journey task failed");
            }
        }
    }
}

impl Drop for JourneyHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// State owned by the spawned task.
struct RunnerTask {
    simulator: JourneySimulator,
    publisher: LocationPublisher,
    state_tx: watch::Sender<JourneyState>,
    events_tx: mpsc::UnboundedSender<JourneyEvent>,
    commands: mpsc::UnboundedReceiver<JourneyCommand>,
    cancel: CancellationToken,
}

/// How a ticking phase ended.
enum PhaseEnd {
    Halted(u32),
    Finished,
}

impl RunnerTask {
    async fn run(mut self) {
        let bus = self.publisher.bus_id().clone();
        let tick_interval = self.simulator.config().tick_interval;
        tracing::info!(
            bus = %bus,
            tick_ms = tick_interval.as_millis() as u64,
            points = self.simulator.route().map(|r| r.path().len()).unwrap_or(0),
            "Journey started"
        );

        self.publish_state();
        self.emit(JourneyEvent::Started(self.simulator.state().clone()));

        loop {
            match self.ticking_phase().await {
                PhaseEnd::Halted(stop) => {
                    if !self.halted_phase(stop).await {
                        break;
                    }
                }
                PhaseEnd::Finished => break,
            }
        }

        let final_state = self.simulator.state().clone();
        tracing::info!(
            bus = %bus,
            status = %final_state.status,
            cursor = final_state.cursor_index,
            "Journey task ended"
        );
        self.publisher.shutdown().await;
    }

    /// Tick until a halt or the end of the journey.
    async fn ticking_phase(&mut self) -> PhaseEnd {
        let period = self.simulator.config().tick_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Journey cancelled while running");
                    self.emit(JourneyEvent::Stopped);
                    return PhaseEnd::Finished;
                }
                command = self.commands.recv(), if commands_open => {
                    match command {
                        Some(command) => self.reject_while_running(command),
                        None => commands_open = false,
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let tick = match self.simulator.tick() {
                Ok(tick) => tick,
                Err(e) => {
                    tracing::error!(error = %e, "Journey failed");
                    self.simulator.fail();
                    self.publish_state();
                    self.emit(JourneyEvent::Failed(e));
                    return PhaseEnd::Finished;
                }
            };

            self.publish_state();

            if let Some(signal) = tick.near_arrival {
                tracing::info!(
                    eta_target = %signal.target,
                    eta_secs = signal.eta_seconds,
                    "Bus arriving soon"
                );
                self.emit(JourneyEvent::NearArrival(signal));
            }

            match tick.outcome {
                TickOutcome::Advanced => {}
                TickOutcome::Halted(halt) => {
                    let stop = halt.stop;
                    tracing::info!(
                        stop,
                        halt_index = halt.halt_index,
                        riders = halt.roster.len(),
                        "Halted at stop, awaiting attendance"
                    );
                    self.emit(JourneyEvent::Halted(halt));
                    return PhaseEnd::Halted(stop);
                }
                TickOutcome::Completed => {
                    tracing::info!("Journey completed");
                    self.emit(JourneyEvent::Completed(self.simulator.state().clone()));
                    return PhaseEnd::Finished;
                }
                TickOutcome::Inactive(status) => {
                    tracing::debug!(status = %status, "Tick on inactive journey");
                    return PhaseEnd::Finished;
                }
            }
        }
    }

    /// Wait for a valid resume. Returns false if the journey was cancelled.
    async fn halted_phase(&mut self, stop: u32) -> bool {
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(stop, "Journey cancelled while halted");
                    self.emit(JourneyEvent::Stopped);
                    return false;
                }
                command = self.commands.recv(), if commands_open => {
                    let Some(JourneyCommand::Resume { stop: requested, reply }) = command else {
                        commands_open = false;
                        continue;
                    };

                    let result = self.simulator.resume(requested);
                    let resumed = result.is_ok();
                    if let Err(e) = &result {
                        tracing::warn!(error = %e, "Rejected resume");
                    }
                    let _ = reply.send(result);

                    if resumed {
                        tracing::info!(stop, "Resumed from stop");
                        self.publish_state();
                        self.emit(JourneyEvent::Resumed { stop });
                        return true;
                    }
                }
            }
        }
    }

    fn reject_while_running(&self, command: JourneyCommand) {
        let JourneyCommand::Resume { stop, reply } = command;
        let _ = reply.send(Err(JourneyError::NotHaltedAt {
            stop,
            status: self.simulator.status(),
        }));
    }

    fn publish_state(&self) {
        let state = self.simulator.state();
        self.publisher.publish(state);
        self.state_tx.send_replace(state.clone());
    }

    fn emit(&self, event: JourneyEvent) {
        // Receiver gone means nobody is listening; the journey carries on.
        let _ = self.events_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::journey::{EtaTarget, JourneyStatus};
    use crate::publisher::PublisherConfig;
    use crate::route::{Path, DEFAULT_STOP_FRACTIONS};
    use crate::store::{BusId, InMemoryLocationStore};
    use std::time::Duration;

    fn route(len: usize) -> Route {
        let points = (0..len)
            .map(|i| Coordinate {
                latitude: 12.9 - i as f64 * 0.0001,
                longitude: 77.47,
            })
            .collect();
        Route::with_fractions(Path::new(points).unwrap(), &DEFAULT_STOP_FRACTIONS)
    }

    fn start(len: usize) -> (JourneyHandle, Arc<InMemoryLocationStore>) {
        let store = Arc::new(InMemoryLocationStore::new());
        let publisher =
            LocationPublisher::start(Arc::clone(&store), BusId::new("1"), PublisherConfig::default());
        let runner = JourneyRunner::new(JourneyConfig::default(), Arc::new(Roster::new()), publisher);
        (runner.start(route(len)).unwrap(), store)
    }

    async fn next_halt(handle: &mut JourneyHandle) -> StopHalt {
        loop {
            match handle.next_event().await {
                Some(JourneyEvent::Halted(halt)) => return halt,
                Some(_) => continue,
                None => panic!("journey ended before halting"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_interval() {
        let (handle, _store) = start(100);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(handle.state().cursor_index, 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(handle.state().cursor_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_halt_stops_the_timer() {
        let (mut handle, _store) = start(100);

        let halt = next_halt(&mut handle).await;
        assert_eq!(halt.stop, 1);
        assert_eq!(halt.halt_index, 25);

        tokio::time::sleep(Duration::from_secs(60)).await;
        let state = handle.state();
        assert_eq!(state.cursor_index, 25);
        assert_eq!(state.status, JourneyStatus::HaltedAtStop { stop: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_wrong_stop_keeps_halt() {
        let (mut handle, _store) = start(100);
        next_halt(&mut handle).await;

        let err = handle.resume(2).await.unwrap_err();
        assert!(matches!(err, JourneyError::NotHaltedAt { stop: 2, .. }));
        assert_eq!(handle.state().status, JourneyStatus::HaltedAtStop { stop: 1 });

        handle.resume(1).await.unwrap();
        let halt = next_halt(&mut handle).await;
        assert_eq!(halt.stop, 2);
        assert_eq!(handle.state().cursor_index, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_while_running_is_rejected() {
        let (handle, _store) = start(100);
        let err = handle.resume(1).await.unwrap_err();
        assert!(matches!(err, JourneyError::NotHaltedAt { stop: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_journey_event_order() {
        let (mut handle, store) = start(100);
        let mut events = Vec::new();

        while let Some(event) = handle.next_event().await {
            if let JourneyEvent::Halted(halt) = &event {
                handle.resume(halt.stop).await.unwrap();
            }
            let done = matches!(event, JourneyEvent::Completed(_));
            events.push(event);
            if done {
                break;
            }
        }

        let halts: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                JourneyEvent::Halted(h) => Some(h.stop),
                _ => None,
            })
            .collect();
        assert_eq!(halts, vec![1, 2, 3]);

        let near: Vec<EtaTarget> = events
            .iter()
            .filter_map(|e| match e {
                JourneyEvent::NearArrival(n) => Some(n.target),
                _ => None,
            })
            .collect();
        assert_eq!(near.last(), Some(&EtaTarget::Destination));
        assert!(matches!(events.first(), Some(JourneyEvent::Started(_))));

        handle.join().await;
        let stored = store.snapshot(&BusId::new("1")).unwrap();
        assert_eq!(stored.status, JourneyStatus::Completed);
        assert_eq!(stored.eta_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_halted_emits_stopped() {
        let (mut handle, _store) = start(100);
        next_halt(&mut handle).await;

        handle.stop();
        assert_eq!(handle.next_event().await, Some(JourneyEvent::Stopped));
        assert_eq!(handle.next_event().await, None);

        let resume = handle.resume_handle();
        assert_eq!(resume.resume(1).await, Err(JourneyError::RunnerStopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_tracks_running_journey() {
        let (handle, store) = start(100);

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let mut watch = handle.watch_state();
        let current = watch.borrow_and_update().cursor_index;
        assert_eq!(current, 10);

        // Let the writer catch up
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(store.snapshot(&BusId::new("1")).unwrap().cursor_index, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_tick_interval_fails_to_start() {
        let store = Arc::new(InMemoryLocationStore::new());
        let publisher =
            LocationPublisher::start(Arc::clone(&store), BusId::new("1"), PublisherConfig::default());
        let config = JourneyConfig {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        let runner = JourneyRunner::new(config, Arc::new(Roster::new()), publisher);

        let err = runner.start(route(100)).err().unwrap();
        assert_eq!(err, JourneyError::ZeroTickInterval);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(store.snapshot(&BusId::new("1")).is_none());
    }
}
