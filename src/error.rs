//! Error types for the Axie ledger.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ingestion, retrieval and contract queries.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure talking to the listings API or the contract RPC.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A single listing that cannot be classified or normalized.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Nothing fetched or nothing persisted. Not a failure.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// Caller supplied an unsupported action or omitted a parameter.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The persistence layer rejected a read or write.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Error::UpstreamUnavailable(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedRecord(msg.into())
    }

    pub fn empty(msg: impl Into<String>) -> Self {
        Error::EmptyResult(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Error::InvalidRequest(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Error::StorageFailure(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// True for the "nothing found" outcome, which callers report as 404 rather than 500.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Error::EmptyResult(_))
    }

    /// Message without the variant prefix, as surfaced to HTTP callers.
    pub fn message(&self) -> &str {
        match self {
            Error::UpstreamUnavailable(m)
            | Error::MalformedRecord(m)
            | Error::EmptyResult(m)
            | Error::InvalidRequest(m)
            | Error::StorageFailure(m)
            | Error::Config(m) => m,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StorageFailure(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::UpstreamUnavailable(err.to_string())
    }
}
