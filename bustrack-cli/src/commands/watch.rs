//! Watch command - follow a bus through the backend.

use std::sync::Arc;

use bustrack::backend::BackendClient;
use bustrack::subscriber::{LocationSubscriber, SubscriberStrategy};

use super::common::{describe_view, resolve_bus};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the watch command.
pub fn run(bus: Option<String>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("watch");
    let config = runner.config();

    let bus = resolve_bus(bus, config)?;
    let subscriber_config = config.subscriber.to_subscriber_config();
    let client = BackendClient::new(&config.store.backend_url, subscriber_config.request_timeout)?;

    println!("BusTrack Watch v{}", bustrack::VERSION);
    println!("====================");
    println!();
    println!("Bus:     {}", bus);
    println!("Backend: {}", config.store.backend_url);
    println!(
        "Polling: every {} ms",
        subscriber_config.poll_interval.as_millis()
    );
    if config.subscriber.strategy == SubscriberStrategy::Push {
        // The HTTP backend has no change feed.
        println!("Note:    push is only available in-process, polling instead");
    }
    println!();
    println!("Press Ctrl+C to stop watching");
    println!();

    runner.block_on(async {
        let subscriber = LocationSubscriber::new(bus, subscriber_config);
        let mut handle = subscriber.attach_polling(Arc::new(client));

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut last_line = String::new();

        loop {
            tokio::select! {
                _ = &mut ctrl_c => break,
                view = handle.changed() => {
                    let Some(view) = view else { break };
                    let line = describe_view(&view);
                    if line != last_line {
                        println!("{}", line);
                        last_line = line;
                    }
                }
            }
        }

        handle.detach().await;
        Ok(())
    })
}
