//! Error types for jenq operations.

use crate::query::QueryError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error for GET '{url}': {message}")]
    Http { url: String, message: String },

    #[error("Bad status code for GET '{url}': wanted 200, got {code}")]
    Status { url: String, code: u16 },

    #[error("Failed to decode response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// A broken internal guarantee (e.g. the fetch pool produced a gap or a
    /// duplicate index). This is a bug, not an expected external failure.
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Whether this error signals a defect rather than an external failure.
    pub fn is_defect(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
