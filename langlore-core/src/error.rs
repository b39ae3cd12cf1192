//! Error types for langlore core.

use std::{error::Error, fmt, io};

/// Error type for langlore core operations.
#[derive(Debug)]
pub enum LangloreError {
    /// An underlying I/O error.
    Io(io::Error),
    /// A JSON serialization or deserialization error.
    Json(serde_json::Error),
    /// A repository record rejected at construction time.
    InvalidRecord(String),
    /// A configuration value rejected during validation.
    InvalidConfig(String),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for LangloreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::InvalidRecord(message) => write!(f, "invalid repository record: {message}"),
            Self::InvalidConfig(message) => write!(f, "invalid configuration: {message}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for LangloreError {}

impl From<io::Error> for LangloreError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for LangloreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Convenience result type for langlore core.
pub type Result<T> = std::result::Result<T, LangloreError>;
