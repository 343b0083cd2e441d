//! Error types for davfixture.

use thiserror::Error;

/// Errors that can occur while managing a fixture server.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Port allocation failed: {0}")]
    PortAllocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to spawn fixture server: {0}")]
    ProcessSpawn(String),

    #[error("Fixture server exited unexpectedly: {0}")]
    ProcessExited(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid identity '{0}': must be a single non-empty path component")]
    InvalidIdentity(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, std::time::Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for davfixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;
