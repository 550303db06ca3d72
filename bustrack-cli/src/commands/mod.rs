//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`demo`] - Drive and watch over an in-process store
//! - [`drive`] - Run a journey with attendance at each stop
//! - [`route`] - Print the configured route
//! - [`serve`] - Run the backend server
//! - [`watch`] - Follow a bus through the backend

pub mod common;
pub mod config;
pub mod demo;
pub mod drive;
pub mod route;
pub mod serve;
pub mod watch;
