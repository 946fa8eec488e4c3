//! Engine error types.

use crate::sync::SyncState;
use eltest_transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the protocol engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Byte-stream or control-line access failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response did not complete in time.
    #[error("no response within {timeout:?} ({} bytes received)", .partial.len())]
    ProtocolTimeout {
        /// The timeout that expired.
        timeout: Duration,
        /// Whatever was received before the deadline.
        partial: String,
    },

    /// A mandatory readiness wait expired during reset.
    #[error("device not ready in state {state} after {waited:?}")]
    SyncTimeout {
        /// State in which the wait expired.
        state: SyncState,
        /// How long the engine waited.
        waited: Duration,
    },

    /// The device did not confirm a clean startup after reset.
    #[error("startup not confirmed: expected {expected:?}, got {actual:?}")]
    SyncVerificationFailed {
        /// Expected status reply.
        expected: String,
        /// Actual status reply.
        actual: String,
    },

    /// The device answered a command with something other than success.
    #[error("unexpected response to {command:?}: {response:?}")]
    UnexpectedResponse {
        /// The command text.
        command: String,
        /// The raw response.
        response: String,
    },

    /// Engine configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
