//! Demo command - drive and watch one bus in a single process.
//!
//! Uses an in-process store with the push subscriber, so observer lines
//! appear as soon as the driver publishes.

use std::sync::Arc;
use std::time::Duration;

use console::style;

use bustrack::attendance::InMemorySink;
use bustrack::store::InMemoryLocationStore;
use bustrack::subscriber::LocationSubscriber;

use super::common::{describe_view, AttendanceMode};
use super::drive::drive;
use crate::error::CliError;
use crate::runner::CliRunner;

const FINAL_VIEW_GRACE: Duration = Duration::from_millis(500);

/// Run the demo command.
pub fn run(debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("demo");
    let config = runner.config();
    let bus = config.journey.bus_id.clone();

    println!("BusTrack Demo v{}", bustrack::VERSION);
    println!("===================");
    println!();
    println!("Bus {} drives; the observer's view is shown with {}", bus, style("👁").cyan());
    println!();

    runner.block_on(async {
        let store = Arc::new(InMemoryLocationStore::new());
        let logs = Arc::new(InMemorySink::new());

        let subscriber = LocationSubscriber::new(bus.clone(), config.subscriber.to_subscriber_config());
        let mut observer = subscriber.attach_push(Arc::clone(&store));
        let mut views = observer.watch();
        let printer = tokio::spawn(async move {
            while views.changed().await.is_ok() {
                let view = views.borrow_and_update().clone();
                println!("  {} {}", style("👁").cyan(), describe_view(&view));
            }
        });

        let result = drive(store, Arc::clone(&logs), bus, config, AttendanceMode::AllPresent).await;

        // Let the observer catch the final state before tearing it down.
        let _ = tokio::time::timeout(FINAL_VIEW_GRACE, observer.changed()).await;
        observer.detach().await;
        let _ = printer.await;

        println!();
        println!(
            "{} attendance records, {} notifications",
            logs.records().len(),
            logs.notifications().len()
        );
        result
    })
}
