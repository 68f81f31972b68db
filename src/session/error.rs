//! Session error types.

use thiserror::Error;

/// Errors surfaced to the UI layer. Asset misses are never errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please check the number: {name} has numbers 1 through {total}.")]
    OutOfRange { number: u32, name: String, total: u32 },
    #[error("Please check the number: {name} has numbers 1 through {total}.")]
    InvalidInput {
        input: String,
        name: String,
        total: u32,
    },
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("No categories are configured")]
    NoCategories,
}

impl SessionError {
    /// Whether this is a user-facing validation failure (as opposed to setup).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::InvalidInput { .. })
    }
}
