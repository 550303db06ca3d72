//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use bustrack::attendance::GateError;
use bustrack::backend::ServerError;
use bustrack::config::ConfigFileError;
use bustrack::journey::JourneyError;
use bustrack::route::RouteError;
use bustrack::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Configuration error
    Config(String),
    /// No usable route
    Route(RouteError),
    /// Journey could not start or resume
    Journey(JourneyError),
    /// Attendance could not be finalized
    Attendance(GateError),
    /// Backend could not be reached
    Backend(StoreError),
    /// Backend server error
    Serve(ServerError),
    /// Interactive prompt failed
    Prompt(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Route(RouteError::RouteUnavailable(_)) => {
                eprintln!();
                eprintln!("The routing service could not be reached. Either:");
                eprintln!("  1. Check network access to the OSRM server in config.ini");
                eprintln!("  2. Set provider = straight under [route] to route offline");
            }
            CliError::Backend(_) => {
                eprintln!();
                eprintln!("Is the backend running? Start one with: bustrack serve");
                eprintln!("Or drive without a backend: bustrack drive --local");
            }
            CliError::Serve(ServerError::Bind { .. }) => {
                eprintln!();
                eprintln!("The address is in use or not permitted. Try: bustrack serve --bind 127.0.0.1:3001");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Route(e) => write!(f, "Failed to build route: {}", e),
            CliError::Journey(e) => write!(f, "Journey error: {}", e),
            CliError::Attendance(e) => write!(f, "Attendance error: {}", e),
            CliError::Backend(e) => write!(f, "Backend error: {}", e),
            CliError::Serve(e) => write!(f, "Server error: {}", e),
            CliError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Route(e) => Some(e),
            CliError::Journey(e) => Some(e),
            CliError::Attendance(e) => Some(e),
            CliError::Backend(e) => Some(e),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<RouteError> for CliError {
    fn from(e: RouteError) -> Self {
        CliError::Route(e)
    }
}

impl From<JourneyError> for CliError {
    fn from(e: JourneyError) -> Self {
        CliError::Journey(e)
    }
}

impl From<GateError> for CliError {
    fn from(e: GateError) -> Self {
        CliError::Attendance(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Backend(e)
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Serve(e)
    }
}
