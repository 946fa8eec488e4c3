//! Error types for the AT protocol.

use thiserror::Error;

/// Errors that can occur when working with the AT protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtError {
    /// Failed to parse a response.
    #[error("failed to parse response: {0}")]
    ParseError(String),

    /// Invalid command format.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The module answered with an error.
    #[error("module error {code}: {message}")]
    ModuleError {
        /// Numeric error code.
        code: u16,
        /// Error text following the code.
        message: String,
    },
}

/// Result type alias for AT protocol operations.
pub type AtResult<T> = Result<T, AtError>;
