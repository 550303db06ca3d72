//! Error types for route resolution.

use thiserror::Error;

/// Errors that can occur while resolving a route.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The geometry source returned no usable route or could not be reached.
    #[error("Route unavailable: {0}")]
    RouteUnavailable(String),

    /// The route geometry violates a structural invariant.
    #[error("Malformed route: {0}")]
    Malformed(String),
}
