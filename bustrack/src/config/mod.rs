//! Configuration for BusTrack components.
//!
//! The INI file at `~/.bustrack/config.ini` is split by concern:
//!
//! - [`settings`] - one struct per `[section]`
//! - [`defaults`] - `DEFAULT_*` constants and `ConfigFile::default()`
//! - `parser` - INI → `ConfigFile`
//! - `writer` - `ConfigFile` → commented INI
//!
//! # Example
//!
//! ```no_run
//! use bustrack::config::ConfigFile;
//!
//! let config = ConfigFile::load().unwrap_or_default();
//! let journey = config.journey.to_journey_config();
//! ```

pub mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, JourneySettings, LoggingSettings, RouteSettings, RouteSource, ServerSettings,
    StoreSettings, SubscriberSettings,
};
