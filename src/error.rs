//! Error types
//!
//! Errors only surface at the edges of the crate: configuration loading,
//! source discovery and server startup. The replay loop itself absorbs
//! per-record failures and counts them instead.

use std::path::PathBuf;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read a source file
    #[error("failed to read {path}: {source}")]
    SourceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited text
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid discovery pattern
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A path matched by discovery could not be inspected
    #[error("file discovery failed: {0}")]
    Glob(#[from] glob::GlobError),

    /// Text encoding label not recognised
    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// Record could not be encoded for broadcast
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid bind address: {0}")]
    InvalidAddr(String),

    #[error("invalid endpoint path (must start with '/' and not be reserved): {0}")]
    InvalidPath(String),
}
