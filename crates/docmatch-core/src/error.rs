//! Error types for the docmatch-core library.

use thiserror::Error;

/// Main error type for the docmatch library.
#[derive(Error, Debug)]
pub enum DocmatchError {
    /// Candidate resolver error.
    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Population snapshot error.
    #[error("population error: {0}")]
    Population(#[from] PopulationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from the candidate resolver boundary.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The population store could not be reached.
    #[error("population store unavailable: {0}")]
    Unavailable(String),

    /// The lookup did not complete within the configured bound.
    #[error("lookup timed out")]
    Timeout,
}

/// Errors while loading the population snapshot.
#[derive(Error, Debug)]
pub enum PopulationError {
    /// Failed to read the snapshot file.
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot row could not be deserialized.
    #[error("malformed snapshot row: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for the docmatch library.
pub type Result<T> = std::result::Result<T, DocmatchError>;
