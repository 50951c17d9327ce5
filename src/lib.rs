//! qdl - command line access to the Quandl financial data API.
//!
//! This library provides the core functionality for the `qdl` CLI tool:
//! layered configuration resolution, a disk-backed response cache, and a
//! thin blocking client for the Quandl REST API.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
pub mod quandl;

/// Library-level error type for qdl operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error in {}: {}", path.display(), source)]
    ConfigParse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot determine the user home directory")]
    NoHomeDir,

    #[error("Cannot determine the executable directory")]
    NoExeDir,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Quandl request failed: {0}")]
    Api(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for qdl operations.
pub type Result<T> = std::result::Result<T, Error>;
