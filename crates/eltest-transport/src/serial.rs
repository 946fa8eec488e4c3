//! Serial-port transport.
//!
//! Bytes go over the UART; control lines are carried on modem signals as
//! described by a [`LineMap`]. Output signals cannot be read back from the
//! port, so their last driven value is cached.

use crate::error::{TransportError, TransportResult};
use crate::lines::{ControlLine, LineMap, ModemSignal};
use crate::Transport;
use serde::{Deserialize, Serialize};
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Default serial device path.
pub const DEFAULT_PORT: &str = "/dev/ttyS0";

/// Default baud rate of ExpressLink modules.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default upper bound for a single `read_available` call, in milliseconds.
pub const DEFAULT_POLL_GRANULARITY_MS: u64 = 20;

/// Size of the scratch buffer used for a single read.
const READ_CHUNK: usize = 1024;

/// Serial transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/ttyS0`, `COM6`).
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Maximum time a single read may wait for data, in milliseconds.
    pub poll_granularity_ms: u64,
    /// Control-line bindings.
    pub lines: LineMap,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            poll_granularity_ms: DEFAULT_POLL_GRANULARITY_MS,
            lines: LineMap::default(),
        }
    }
}

impl SerialConfig {
    /// Read timeout applied to the port.
    pub fn poll_granularity(&self) -> Duration {
        Duration::from_millis(self.poll_granularity_ms)
    }
}

/// A [`Transport`] over a serial port.
///
/// The port is closed when the transport is dropped.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    lines: LineMap,
    wake: bool,
    reset: bool,
}

impl SerialTransport {
    /// Open the configured port.
    pub fn open(config: &SerialConfig) -> TransportResult<Self> {
        config.lines.validate()?;
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.poll_granularity())
            .open()?;
        debug!(port = %config.port, baud = config.baud_rate, "opened serial transport");
        Ok(Self::with_port(port, config.lines.clone()))
    }

    fn with_port(port: Box<dyn SerialPort>, lines: LineMap) -> Self {
        SerialTransport {
            port,
            lines,
            wake: false,
            reset: false,
        }
    }

    fn write_signal(&mut self, line: ControlLine, signal: ModemSignal, level: bool) -> TransportResult<()> {
        match signal {
            ModemSignal::Dtr => self.port.write_data_terminal_ready(level)?,
            ModemSignal::Rts => self.port.write_request_to_send(level)?,
            _ => return Err(TransportError::InvalidBinding { line, signal }),
        }
        Ok(())
    }

    fn read_signal(&mut self, line: ControlLine, signal: ModemSignal) -> TransportResult<bool> {
        let level = match signal {
            ModemSignal::Cts => self.port.read_clear_to_send()?,
            ModemSignal::Dsr => self.port.read_data_set_ready()?,
            ModemSignal::Ri => self.port.read_ring_indicator()?,
            ModemSignal::Cd => self.port.read_carrier_detect()?,
            _ => return Err(TransportError::InvalidBinding { line, signal }),
        };
        Ok(level)
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<()> {
        trace!(len = bytes.len(), "serial write");
        self.port.write_all(bytes).map_err(map_io)?;
        self.port.flush().map_err(map_io)?;
        Ok(())
    }

    fn read_available(&mut self) -> TransportResult<Vec<u8>> {
        let mut buf = vec![0u8; READ_CHUNK];
        match self.port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                if n > 0 {
                    trace!(len = n, "serial read");
                }
                Ok(buf)
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(Vec::new())
            }
            Err(e) => Err(map_io(e)),
        }
    }

    fn set_line(&mut self, line: ControlLine, asserted: bool) -> TransportResult<()> {
        if line == ControlLine::Event {
            return Err(TransportError::ReadOnlyLine(line));
        }
        let binding = self.lines.binding(line);
        trace!(%line, asserted, signal = %binding.signal, "set control line");
        self.write_signal(line, binding.signal, binding.to_level(asserted))?;
        // Only cache what the port actually took.
        if line == ControlLine::Wake {
            self.wake = asserted;
        } else {
            self.reset = asserted;
        }
        Ok(())
    }

    fn get_line(&mut self, line: ControlLine) -> TransportResult<bool> {
        match line {
            ControlLine::Wake => Ok(self.wake),
            ControlLine::Reset => Ok(self.reset),
            ControlLine::Event => {
                let binding = self.lines.binding(line);
                let level = self.read_signal(line, binding.signal)?;
                Ok(binding.from_level(level))
            }
        }
    }

    fn flush_input(&mut self) -> TransportResult<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        debug!(port = ?self.port.name(), "closing serial transport");
    }
}

fn map_io(e: std::io::Error) -> TransportError {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::NotConnected | ErrorKind::UnexpectedEof => {
            TransportError::Disconnected
        }
        _ => TransportError::Io(e),
    }
}
