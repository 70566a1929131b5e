//! Error types for skein-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for skein-jsonl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line could not be turned into a record in strict mode.
    #[error("Invalid JSONL format: {0}")]
    InvalidFormat(String),
}

/// A specialized Result type for skein-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
