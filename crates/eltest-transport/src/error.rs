//! Error types for the transport layer.

use crate::lines::{ControlLine, ModemSignal};
use thiserror::Error;

/// Errors raised while moving bytes or touching control lines.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O failure on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial port could not be opened or configured.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The stream has been closed or the device went away.
    #[error("transport disconnected")]
    Disconnected,

    /// A line name other than `wake`, `reset` or `event`.
    #[error("unknown control line: {0:?}")]
    UnknownLine(String),

    /// Attempt to drive a line that is an input.
    #[error("control line {0} is an input and cannot be driven")]
    ReadOnlyLine(ControlLine),

    /// A line is bound to a modem signal with the wrong direction.
    #[error("control line {line} cannot be bound to modem signal {signal}")]
    InvalidBinding {
        /// The control line being bound.
        line: ControlLine,
        /// The offending modem signal.
        signal: ModemSignal,
    },
}

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
