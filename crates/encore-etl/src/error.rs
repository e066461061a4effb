//! Error types for ingestion and snapshot I/O.

use thiserror::Error;

/// Errors that can occur while fetching playlists or reading and writing
/// snapshots.
#[derive(Debug, Error)]
pub enum EtlError {
    /// An HTTP request to the catalog failed.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The catalog returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The catalog refused the request (bad credentials, forbidden, etc.).
    #[error("{source_name} rejected the request ({status}): {message}")]
    Rejected {
        source_name: String,
        status: u16,
        message: String,
    },

    /// The requested playlist does not exist or is not visible.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// A catalog response could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// A snapshot could not be read or written as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error propagated from the core domain layer.
    #[error("{0}")]
    Core(#[from] encore_core::Error),

    /// Catalog credentials are not configured.
    #[error("catalog credentials are not configured (set client_id and client_secret)")]
    MissingCredentials,

    /// No playlists are configured to fetch.
    #[error("no playlists configured (add a [playlists] table or pl_<year> variables)")]
    NoPlaylists,

    /// A snapshot the step reads from has not been written yet.
    #[error("snapshot not found: {}", .path.display())]
    MissingSnapshot { path: std::path::PathBuf },

    /// The configuration cannot be used as given.
    #[error("configuration error: {0}")]
    Config(String),

    /// A snapshot row does not have the expected shape.
    #[error("invalid table at line {line}: {message}")]
    InvalidTable { line: u64, message: String },
}

impl EtlError {
    /// Returns `true` when the error is transient and the operation may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimited { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` when the error indicates the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<encore_core::MatrixBuildError> for EtlError {
    fn from(e: encore_core::MatrixBuildError) -> Self {
        Self::Core(e.into())
    }
}

/// Convenience alias for ingestion results.
pub type EtlResult<T> = std::result::Result<T, EtlError>;
