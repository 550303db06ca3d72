//! Route command - resolve the configured route and print it.

use super::common::{describe_route, resolve_route};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the route command.
pub fn run(debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("route");
    let config = runner.config();

    let route = runner.block_on(resolve_route(&config.route))?;

    println!("Route ({})", config.route.provider);
    println!("=============");
    println!();
    println!("From:  {}", config.route.origin);
    println!("To:    {}", config.route.destination);
    println!("Total: {}", describe_route(&route));
    println!();

    for (stop, position) in route.stop_positions() {
        let riders: Vec<String> = config
            .roster
            .for_stop(stop)
            .into_iter()
            .map(|p| p.name)
            .collect();
        let riders = if riders.is_empty() {
            "(no roster)".to_string()
        } else {
            riders.join(", ")
        };
        println!("  Stop {}  {}  {}", stop, position, riders);
    }

    Ok(())
}
