//! Error types for lrucache

use thiserror::Error;

/// Result type alias for lrucache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the cache
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The cache was configured with unusable parameters (e.g. zero capacity)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The index and the recency list disagree
    #[error("Inconsistent cache state: {0}")]
    Inconsistent(String),
}
