//! Unified error types for stockroom.
//!
//! Every variant renders with a stable upper-case code prefix so log lines
//! and HTTP error bodies can be grepped by kind.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// Unified error types shared by the client, server and CLI.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid configuration. Raised before any I/O.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    /// Non-2xx response from a storefront API.
    #[error("REMOTE_API_ERROR: status {status}: {body}")]
    RemoteApi { status: u16, body: String },

    /// Connection-level failure talking to a storefront API.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Request to a storefront API timed out.
    #[error("NETWORK_TIMEOUT")]
    Timeout,

    /// A storefront API answered with a body we could not decode.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// Reading a cache entry failed.
    #[error("CACHE_READ_ERROR: {path}: {reason}")]
    CacheRead { path: PathBuf, reason: String },

    /// Writing a cache entry failed.
    #[error("CACHE_WRITE_ERROR: {path}: {reason}")]
    CacheWrite { path: PathBuf, reason: String },

    /// The requested entity does not exist upstream or in the cache.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Invalid input parameters (e.g., empty id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The configured backend does not offer this operation.
    #[error("UNSUPPORTED: {0}")]
    Unsupported(String),

    /// A background task panicked or was cancelled.
    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn cache_read(path: &Path, reason: impl ToString) -> Self {
        Error::CacheRead { path: path.to_path_buf(), reason: reason.to_string() }
    }

    pub(crate) fn cache_write(path: &Path, reason: impl ToString) -> Self {
        Error::CacheWrite { path: path.to_path_buf(), reason: reason.to_string() }
    }

    /// True for failures that came from talking to a storefront API.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::RemoteApi { .. } | Error::Network(_) | Error::Timeout | Error::Parse(_))
    }
}
