//! Transport layer for driving an ExpressLink module.
//!
//! This crate moves raw bytes and toggles the auxiliary control lines of a
//! module. It knows nothing about the AT command protocol; framing and
//! synchronization live in `eltest-engine`.
//!
//! # Control lines
//!
//! Three lines are modelled, each with a logical value where `true` means
//! *asserted*:
//!
//! - `wake` (output): keeps the module out of its idle sleep
//! - `reset` (output): reset control, physical polarity set per device
//! - `event` (input): driven by the module to signal readiness
//!
//! # Implementations
//!
//! - [`SerialTransport`] talks to a real serial port, mapping control lines
//!   onto modem signals (DTR/RTS out, CTS/DSR/RI/CD in).
//! - [`mock::MockTransport`] is a scripted in-memory device used by tests.

mod error;
mod lines;
pub mod mock;
mod serial;

pub use error::*;
pub use lines::*;
pub use serial::*;

/// A byte stream plus control lines.
///
/// Writes are blocking; reads return whatever is buffered and never wait
/// longer than the transport's poll granularity, so callers can compose
/// them into their own timeout loops.
pub trait Transport {
    /// Send all bytes to the device.
    fn write(&mut self, bytes: &[u8]) -> TransportResult<()>;

    /// Return the bytes currently available (possibly none).
    fn read_available(&mut self) -> TransportResult<Vec<u8>>;

    /// Drive an output line to its logical value.
    fn set_line(&mut self, line: ControlLine, asserted: bool) -> TransportResult<()>;

    /// Read the logical value of a line.
    ///
    /// Output lines report the value they were last driven to.
    fn get_line(&mut self, line: ControlLine) -> TransportResult<bool>;

    /// Discard any bytes received but not yet read.
    fn flush_input(&mut self) -> TransportResult<()>;

    /// Set a line by its name (`wake`, `reset` or `event`).
    fn set_named_line(&mut self, name: &str, asserted: bool) -> TransportResult<()> {
        let line: ControlLine = name.parse()?;
        self.set_line(line, asserted)
    }

    /// Read a line by its name (`wake`, `reset` or `event`).
    fn get_named_line(&mut self, name: &str) -> TransportResult<bool> {
        let line: ControlLine = name.parse()?;
        self.get_line(line)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<()> {
        (**self).write(bytes)
    }

    fn read_available(&mut self) -> TransportResult<Vec<u8>> {
        (**self).read_available()
    }

    fn set_line(&mut self, line: ControlLine, asserted: bool) -> TransportResult<()> {
        (**self).set_line(line, asserted)
    }

    fn get_line(&mut self, line: ControlLine) -> TransportResult<bool> {
        (**self).get_line(line)
    }

    fn flush_input(&mut self) -> TransportResult<()> {
        (**self).flush_input()
    }
}
