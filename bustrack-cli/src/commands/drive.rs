//! Drive command - run a journey and take attendance at every stop.

use std::future::Future;
use std::sync::Arc;

use bustrack::attendance::{AttendanceGate, AttendanceSink, InMemorySink, NotificationSink};
use bustrack::backend::{BackendClient, DEFAULT_HTTP_TIMEOUT};
use bustrack::config::ConfigFile;
use bustrack::journey::{JourneyEvent, JourneyHandle, JourneyRunner};
use bustrack::publisher::LocationPublisher;
use bustrack::store::{BusId, InMemoryLocationStore, LocationStore};

use super::common::{
    describe_route, describe_state, print_event, resolve_bus, resolve_route, take_attendance,
    AttendanceMode,
};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the drive command.
pub struct DriveArgs {
    pub bus: Option<String>,
    pub local: bool,
    pub all_present: bool,
    pub debug: bool,
}

/// Run the drive command.
pub fn run(args: DriveArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("drive");
    let config = runner.config();

    let bus = resolve_bus(args.bus, config)?;
    let mode = if args.all_present {
        AttendanceMode::AllPresent
    } else {
        AttendanceMode::Prompt
    };

    println!("BusTrack Driver v{}", bustrack::VERSION);
    println!("=====================");
    println!();
    println!("Bus:   {}", bus);

    let result = runner.block_on(async {
        if args.local {
            println!("Store: in-process (nothing leaves this terminal)");
            let store = Arc::new(InMemoryLocationStore::new());
            let logs = Arc::new(InMemorySink::new());
            drive(Arc::clone(&store), logs, bus.clone(), config, mode).await?;

            if let Some(state) = store.get(&bus).await? {
                println!("Final state: {}", describe_state(&state));
            }
            Ok(())
        } else {
            println!("Store: {}", config.store.backend_url);
            let client = Arc::new(BackendClient::new(
                &config.store.backend_url,
                DEFAULT_HTTP_TIMEOUT,
            )?);
            client.health().await?;
            drive(Arc::clone(&client), client, bus, config, mode).await
        }
    });
    runner.finish();
    result
}

/// Resolve the route, start the journey and handle events until it ends.
pub async fn drive<S, L>(
    store: Arc<S>,
    logs: Arc<L>,
    bus: BusId,
    config: &ConfigFile,
    mode: AttendanceMode,
) -> Result<(), CliError>
where
    S: LocationStore,
    L: AttendanceSink + NotificationSink,
{
    let route = resolve_route(&config.route).await?;
    println!("Route: {} ({})", describe_route(&route), config.route.provider);
    println!();
    println!("Press Ctrl+C to stop the journey");
    println!();

    let publisher = LocationPublisher::start(store, bus.clone(), config.store.to_publisher_config());
    let journey = JourneyRunner::new(
        config.journey.to_journey_config(),
        Arc::new(config.roster.clone()),
        publisher,
    )
    .start(route)?;
    let gate = AttendanceGate::new(bus, Arc::clone(&logs), logs, journey.resume_handle());

    run_events(journey, gate, mode, ctrl_c()).await
}

/// Print events and resolve halts until the journey task ends.
///
/// `shutdown` stops the journey when it resolves, including while a stop's
/// attendance is still being taken.
async fn run_events<A, N, F>(
    mut journey: JourneyHandle,
    mut gate: AttendanceGate<A, N>,
    mode: AttendanceMode,
    shutdown: F,
) -> Result<(), CliError>
where
    A: AttendanceSink,
    N: NotificationSink,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stopping = false;
    let mut outcome = Ok(());

    loop {
        tokio::select! {
            _ = &mut shutdown, if !stopping => {
                stopping = true;
                stop_journey(&journey);
            }
            event = journey.next_event() => {
                let Some(event) = event else { break };
                print_event(&event);
                match event {
                    JourneyEvent::Halted(halt) => {
                        tokio::select! {
                            _ = &mut shutdown, if !stopping => {
                                stopping = true;
                                stop_journey(&journey);
                            }
                            result = take_attendance(&mut gate, halt, mode) => {
                                if let Err(e) = result {
                                    outcome = Err(e);
                                    journey.stop();
                                }
                            }
                        }
                    }
                    JourneyEvent::Failed(e) => outcome = Err(e.into()),
                    _ => {}
                }
            }
        }
    }

    journey.join().await;
    outcome
}

fn stop_journey(journey: &JourneyHandle) {
    println!();
    println!("Stopping...");
    journey.stop();
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
