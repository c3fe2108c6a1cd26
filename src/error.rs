//! Error types for zero-query.

use thiserror::Error;

/// Result type for zero-query operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Fields of a server error response.
#[derive(Debug, Clone, Default)]
pub struct ErrorFields {
    /// Severity: ERROR, FATAL, PANIC, WARNING, NOTICE, DEBUG, INFO, LOG
    pub severity: Option<String>,
    /// SQLSTATE error code (5 characters)
    pub code: Option<String>,
    /// Primary error message
    pub message: Option<String>,
    /// Detailed error explanation
    pub detail: Option<String>,
    /// Suggestion for fixing the error
    pub hint: Option<String>,
}

impl ErrorFields {
    /// Create an `ERROR`-severity response with a SQLSTATE code and message.
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Some("ERROR".into()),
            code: Some(code.into()),
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

impl std::fmt::Display for ErrorFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(severity) = &self.severity {
            write!(f, "{}: ", severity)?;
        }
        if let Some(message) = &self.message {
            write!(f, "{}", message)?;
        }
        if let Some(code) = &self.code {
            write!(f, " (SQLSTATE {})", code)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "\nDETAIL: {}", detail)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\nHINT: {}", hint)?;
        }
        Ok(())
    }
}

/// Error type for zero-query.
#[derive(Debug, Error)]
pub enum Error {
    /// Server error response
    #[error("Server error: {0}")]
    Server(Box<ErrorFields>),

    /// Protocol error (malformed message, unexpected response, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection is broken and cannot be reused
    #[error("Connection is broken")]
    ConnectionBroken,

    /// Operation not allowed in the query's current state
    /// (concurrent execute, execute after close, fetch size on a simple statement)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid usage (bad options, wrong parameter count)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// Column value could not be decoded into the requested type
    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Build a server error with `ERROR` severity.
    pub fn server(code: &str, message: impl Into<String>) -> Self {
        Error::Server(Box::new(ErrorFields::new(code, message)))
    }

    /// Returns true if the error indicates the connection is broken and cannot be reused.
    pub fn is_connection_broken(&self) -> bool {
        match self {
            Error::Io(_) | Error::ConnectionBroken => true,
            Error::Server(fields) => {
                // FATAL and PANIC errors terminate the session
                matches!(
                    fields.severity.as_deref(),
                    Some("FATAL") | Some("PANIC")
                )
            }
            _ => false,
        }
    }

    /// Returns true if the operation was rejected by the query state machine.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }

    /// Get the SQLSTATE code if this is a server error.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Server(fields) => fields.code.as_deref(),
            _ => None,
        }
    }
}
