//! The protocol engine and its command exchange.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::observer::{CommandObserver, SilentObserver};
use crate::poll::{poll_until, PollError};
use eltest_at_protocol::{decode_latin1, encode_latin1, Command, LineCodec};
use eltest_transport::{Transport, TransportError};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Drives one module over one exclusively owned transport.
///
/// All methods take `&mut self`, so exchanges are serialized by ownership.
/// Sharing an engine between threads needs an external `Mutex`.
pub struct ProtocolEngine<T: Transport> {
    transport: T,
    codec: LineCodec,
    config: EngineConfig,
    observer: Box<dyn CommandObserver + Send>,
}

impl<T: Transport> ProtocolEngine<T> {
    /// Create an engine over an open transport.
    pub fn new(transport: T, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(ProtocolEngine {
            transport,
            codec: LineCodec::new(),
            config,
            observer: Box::new(SilentObserver),
        })
    }

    /// Replace the observer that receives echoed exchanges.
    pub fn with_observer(mut self, observer: impl CommandObserver + Send + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Send `payload` and wait up to `timeout` for a newline-terminated
    /// response.
    ///
    /// The payload is written as is (ISO-8859-1); the caller includes the
    /// command's own line ending. An empty payload only waits. The response
    /// is exactly one line, terminator included; anything received after the
    /// terminator is kept for the next exchange.
    ///
    /// On timeout the bytes received so far are returned inside
    /// [`EngineError::ProtocolTimeout`] and dropped from the buffer.
    pub fn send_command(&mut self, payload: &str, timeout: Duration, echo: bool) -> EngineResult<String> {
        if !payload.is_empty() {
            trace!(payload = ?payload, "sending command");
            self.transport.write(&encode_latin1(payload))?;
        }
        if echo {
            self.observer.on_request(payload);
        }

        let transport = &mut self.transport;
        let codec = &mut self.codec;
        let observer = &mut self.observer;
        let outcome = poll_until(self.config.command_poll, timeout, || {
            let chunk = transport.read_available()?;
            codec.push(&chunk);
            if echo {
                observer.on_poll();
            }
            Ok::<_, TransportError>(codec.take_line())
        });

        match outcome {
            Ok(line) => {
                let response = decode_latin1(&line);
                trace!(response = ?response, "received response");
                if echo {
                    self.observer.on_response(payload, &response);
                }
                Ok(response)
            }
            Err(PollError::TimedOut { elapsed }) => {
                let partial = decode_latin1(&self.codec.take_all());
                warn!(payload = ?payload, ?elapsed, partial = ?partial, "command timed out");
                if echo {
                    self.observer.on_timeout(payload, &partial);
                }
                Err(EngineError::ProtocolTimeout { timeout, partial })
            }
            Err(PollError::Failed(e)) => Err(e.into()),
        }
    }

    /// Send a typed command with the configured timeout and no echo.
    pub fn command(&mut self, command: &Command) -> EngineResult<String> {
        let timeout = self.config.command_timeout;
        self.send_command(&command.to_command_string(), timeout, false)
    }

    /// Wait for one unsolicited line without sending anything.
    pub fn wait_for_line(&mut self, timeout: Duration) -> EngineResult<String> {
        self.send_command("", timeout, false)
    }

    /// Discard stale input, both in the transport and carried over here.
    pub fn flush(&mut self) -> EngineResult<()> {
        let dropped = self.codec.buffered_len();
        self.codec.clear();
        self.transport.flush_input()?;
        debug!(dropped, "flushed input");
        Ok(())
    }

    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the engine and its transport.
    pub fn close(self) {
        debug!("closing protocol engine");
        drop(self.transport);
    }
}
