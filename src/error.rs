//! Error types for the Gradian client library.

use thiserror::Error;

use crate::voice::MediaErrorKind;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur when using the Gradian client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid response body from the backend
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Non-success HTTP status reported by the backend
    #[error("HTTP error {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// Parse error when decoding backend payloads or agent output
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid command or parameters
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// A generated schema failed approval validation
    #[error("{0}")]
    SchemaValidation(String),

    /// A discussion message is its own ancestor
    #[error("Cyclic thread reference at engagement {id}")]
    CyclicThread {
        /// Id of the engagement that closes the cycle
        id: String,
    },

    /// Microphone or media device failure
    #[error("Media error: {}", .0.message())]
    Media(MediaErrorKind),

    /// The microphone is still owned by another recording session
    #[error("Microphone is already in use by another recording session")]
    DeviceBusy,

    /// The request was deliberately cancelled or superseded
    #[error("Request aborted")]
    Aborted,

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A preload route template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Transport failure (connection refused, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Whether this error represents a deliberate cancellation.
    ///
    /// Aborted requests are not failures and should not be shown to the user.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Aborted | Error::Media(MediaErrorKind::Aborted))
    }

    /// The HTTP status code, if this error came from a backend response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<futures::future::Aborted> for Error {
    fn from(_: futures::future::Aborted) -> Self {
        Error::Aborted
    }
}
