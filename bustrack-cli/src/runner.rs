//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and the tokio runtime
//! so command handlers stay focused on their own work.

use std::future::Future;
use std::io::IsTerminal;
use std::time::Duration;

use bustrack::config::ConfigFile;
use bustrack::logging::{init_logging, split_log_path, LoggingGuard};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// How long shutdown waits for blocking work such as an abandoned prompt.
const BLOCKING_SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    /// Create a runner, loading config and initializing logging.
    ///
    /// Log lines go to stdout only when stdout is not a terminal, so
    /// interactive output and prompts stay readable.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, defaults to debug-level logging if RUST_LOG is unset
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let (log_dir, log_file) = split_log_path(&config.logging.file);
        let stdout_enabled = !std::io::stdout().is_terminal();

        let logging_guard = init_logging(&log_dir, &log_file, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("BusTrack v{}", bustrack::VERSION);
        info!(
            "BusTrack CLI: {} command (log: {})",
            command,
            self.logging_guard.log_path().display()
        );
    }

    /// Drive a command's future to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Shut the runtime down without waiting on a prompt still reading stdin.
    pub fn finish(self) {
        self.runtime.shutdown_timeout(BLOCKING_SHUTDOWN_GRACE);
    }
}
