//! Error types for the squatwatch system
//!
//! Errors fall into two groups. Fatal errors (`InvalidInput`, `HistoryLoad`,
//! `Config`) abort a run before any finding is reported. Recoverable errors
//! (`Probe`, `Persistence`, `Notifier`) are logged where they happen and the
//! run continues with degraded results.

use thiserror::Error;

/// Result type alias for squatwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the squatwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed root domain or invocation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// DNS/WHOIS failure for a single candidate
    #[error("Probe failed for {domain}: {message}")]
    Probe {
        /// Candidate that failed
        domain: String,
        /// Error message
        message: String,
    },

    /// History write failure for a single record
    #[error("Persistence failed for {domain}: {message}")]
    Persistence {
        /// Domain whose record could not be written
        domain: String,
        /// Error message
        message: String,
    },

    /// Notification sink failure
    #[error("Notifier error ({notifier}): {message}")]
    Notifier {
        /// Notifier name
        notifier: String,
        /// Error message
        message: String,
    },

    /// History could not be read for a client
    #[error("Cannot load history for client {client}: {message}")]
    HistoryLoad {
        /// Client identity
        client: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from notifier endpoints)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a probe error
    pub fn probe(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Probe {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a notifier error
    pub fn notifier(notifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notifier {
            notifier: notifier.into(),
            message: message.into(),
        }
    }

    /// Create a history load error
    pub fn history_load(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HistoryLoad {
            client: client.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this error must abort the run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::HistoryLoad { .. } | Self::Config(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
