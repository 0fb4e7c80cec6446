//! Error types for wifiwatch
//!
//! Every failure the monitor can see is one of these. None of them is
//! fatal to a running daemon; the owning loop logs and retries.

use thiserror::Error;

/// Result type alias for wifiwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for wifiwatch
#[derive(Error, Debug)]
pub enum Error {
    /// Network scan failed (tool missing, non-zero exit, timeout)
    #[error("Scan error: {0}")]
    Scan(String),

    /// Messaging transport failed (connection, timeout, HTTP status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Transport answered but the body did not match the expected schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a scan error
    pub fn scan(msg: impl Into<String>) -> Self {
        Self::Scan(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the owning loop should retry after this error.
    ///
    /// Configuration errors are the only kind that retrying cannot fix.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
