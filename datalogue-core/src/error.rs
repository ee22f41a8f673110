//! Error types for datalogue-core
//!
//! The reduction pipeline itself never fails on malformed input; partial
//! payloads are steady state mid-stream and degrade to "no structured data".
//! Errors here cover the surrounding plumbing: configuration and explicit
//! serialization calls.

use thiserror::Error;

/// Main error type for the datalogue-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for datalogue-core
pub type Result<T> = std::result::Result<T, Error>;
