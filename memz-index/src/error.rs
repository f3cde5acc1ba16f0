//! Error types for the MEMZ index engine.

use thiserror::Error;

/// Top-level error type for all index engine operations.
///
/// Queries never fail; absence is modelled as `None` or an empty `Vec`.
/// Only configuration can be rejected.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A configuration value is outside its allowed range.
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfiguration {
        /// Which setting was rejected.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Configuration text could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Shorthand for a rejected cache capacity.
    pub(crate) fn zero_capacity() -> Self {
        Self::InvalidConfiguration {
            field: "cache_size",
            reason: "must be a positive integer (got 0)".to_string(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, IndexError>;
