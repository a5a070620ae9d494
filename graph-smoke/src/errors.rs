//! Error types for graph-smoke.

/// Alias for Results returning [`SmokeError`].
pub type Result<T> = std::result::Result<T, SmokeError>;

/// Top-level error type for graph-smoke.
#[derive(Debug, thiserror::Error)]
pub enum SmokeError {
    /// The store could not be reached when the driver was built.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store became unreachable during a call.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<neo4rs::Error> for SmokeError {
    fn from(err: neo4rs::Error) -> Self {
        let msg = err.to_string();
        match err {
            neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
                SmokeError::StorageUnavailable(msg)
            }
            _ => SmokeError::Query(msg),
        }
    }
}
