//! HTTP backend: the networked shared store.
//!
//! - [`BackendServer`] - axum server holding bus locations and the
//!   attendance/notification logs
//! - [`BackendClient`] - reqwest client implementing the store and sink traits

mod client;
mod server;
mod wire;

pub use client::{BackendClient, DEFAULT_HTTP_TIMEOUT};
pub use server::{create_router, BackendServer, BackendState, ServerError, DEFAULT_BIND};
pub use wire::{BusUpdate, MessageBody, StatusQuery};
