//! Error types for location stores.

use thiserror::Error;

/// Errors that can occur when reading or writing a location store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The operation did not finish within its time budget.
    #[error("Store operation timed out after {0} ms")]
    Timeout(u64),

    /// The store could not be reached.
    #[error("Store transport failed: {0}")]
    Transport(String),

    /// The store answered with an unexpected status.
    #[error("Store returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// The store answered with something that is not a journey state.
    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Build a timeout error from an elapsed budget.
    pub fn timeout(budget: std::time::Duration) -> Self {
        StoreError::Timeout(budget.as_millis() as u64)
    }
}
