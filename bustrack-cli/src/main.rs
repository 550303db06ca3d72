//! BusTrack CLI - Command-line interface
//!
//! Drive a simulated bus, watch one from another terminal, or run the
//! backend that connects the two.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "bustrack")]
#[command(version = bustrack::VERSION)]
#[command(about = "Simulate a school bus journey with stop-gated attendance and live tracking", long_about = None)]
struct Cli {
    /// Default to debug-level logging when RUST_LOG is unset
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a bus along the configured route, taking attendance at each stop
    Drive {
        /// Bus number (defaults to [journey] bus_id)
        #[arg(long)]
        bus: Option<String>,

        /// Publish to an in-process store instead of the backend
        #[arg(long)]
        local: bool,

        /// Mark everyone present without prompting
        #[arg(long)]
        all_present: bool,
    },

    /// Follow a bus through the backend until Ctrl+C
    Watch {
        /// Bus number (defaults to [journey] bus_id)
        #[arg(long)]
        bus: Option<String>,
    },

    /// Drive and watch a bus in one process, no backend needed
    Demo,

    /// Run the backend server
    Serve {
        /// Address to listen on (defaults to [server] bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Resolve the configured route and print its stops
    Route,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Drive {
            bus,
            local,
            all_present,
        } => commands::drive::run(commands::drive::DriveArgs {
            bus,
            local,
            all_present,
            debug: cli.debug,
        }),
        Commands::Watch { bus } => commands::watch::run(bus, cli.debug),
        Commands::Demo => commands::demo::run(cli.debug),
        Commands::Serve { bind } => commands::serve::run(bind, cli.debug),
        Commands::Route => commands::route::run(cli.debug),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
