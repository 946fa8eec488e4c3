//! Reset/synchronization state machine.
//!
//! Brings a module from an unknown power-on state to a verified clean
//! startup:
//!
//! 1. assert wake, release reset, let the lines settle
//! 2. wait for the event line to go quiet (tolerant: a timeout is ignored)
//! 3. assert reset, wait for the event line to go active (mandatory)
//! 4. flush, then send `AT+FACTORY_RESET`
//! 5. repeat the tolerant/mandatory pair for each reboot that follows
//! 6. flush, query `AT+EVENT?` and require the exact startup signature
//!
//! Any failure aborts the sequence and parks the lines with reset released
//! and wake asserted.

use crate::config::SyncConfig;
use crate::engine::ProtocolEngine;
use crate::error::{EngineError, EngineResult};
use crate::poll::{poll_until, PollError};
use eltest_at_protocol::{Command, Event};
use eltest_transport::{ControlLine, Transport, TransportError};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Stage of the synchronization sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Nothing known about the module yet.
    Unknown,
    /// Wake asserted, waiting for the event line to go quiet.
    AwaitingQuiet,
    /// Reset line asserted.
    ResetAsserted,
    /// Waiting for the event line after the reset assertion.
    AwaitingReady,
    /// Discarding stale input.
    Flushing,
    /// Factory reset command in flight.
    FactoryResetting,
    /// Waiting for the module to come back from a reboot.
    AwaitingReady2,
    /// Startup verified; commands can be trusted.
    Synchronized,
}

impl SyncState {
    /// Get the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Unknown => "UNKNOWN",
            SyncState::AwaitingQuiet => "AWAITING_QUIET",
            SyncState::ResetAsserted => "RESET_ASSERTED",
            SyncState::AwaitingReady => "AWAITING_READY",
            SyncState::Flushing => "FLUSHING",
            SyncState::FactoryResetting => "FACTORY_RESETTING",
            SyncState::AwaitingReady2 => "AWAITING_READY_2",
            SyncState::Synchronized => "SYNCHRONIZED",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing of one quiet/ready wait pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairReport {
    /// Time until the event line went quiet, `None` if the wait timed out.
    pub quiet: Option<Duration>,
    /// Time until the event line went active.
    pub ready: Duration,
}

/// Summary of a successful synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// One entry per wait pair, in order.
    pub pairs: Vec<PairReport>,
    /// Total time spent.
    pub elapsed: Duration,
}

impl<T: Transport> ProtocolEngine<T> {
    /// Reset the module and verify a clean startup.
    ///
    /// Fails with [`EngineError::SyncTimeout`] if the module never signals
    /// readiness, [`EngineError::SyncVerificationFailed`] if its status reply
    /// is not the configured startup signature, and with transport or
    /// protocol errors as they occur. Nothing is retried.
    pub fn reset_device(&mut self) -> EngineResult<SyncReport> {
        let config = self.config().sync.clone();
        let start = Instant::now();
        let mut sync = Synchronizer {
            engine: self,
            config,
            state: SyncState::Unknown,
            pairs: Vec::new(),
        };

        match sync.run() {
            Ok(()) => {
                let report = SyncReport {
                    pairs: sync.pairs,
                    elapsed: start.elapsed(),
                };
                info!(elapsed = ?report.elapsed, "device synchronized");
                Ok(report)
            }
            Err(e) => {
                warn!(state = %sync.state, error = %e, "reset aborted");
                sync.park();
                Err(e)
            }
        }
    }
}

struct Synchronizer<'e, T: Transport> {
    engine: &'e mut ProtocolEngine<T>,
    config: SyncConfig,
    state: SyncState,
    pairs: Vec<PairReport>,
}

impl<T: Transport> Synchronizer<'_, T> {
    fn run(&mut self) -> EngineResult<()> {
        self.enter(SyncState::AwaitingQuiet);
        let transport = self.engine.transport_mut();
        transport.set_line(ControlLine::Wake, true)?;
        transport.set_line(ControlLine::Reset, false)?;
        thread::sleep(self.config.settle);
        let quiet = self.await_quiet()?;

        self.enter(SyncState::ResetAsserted);
        self.engine.transport_mut().set_line(ControlLine::Reset, true)?;

        self.enter(SyncState::AwaitingReady);
        let ready = self.await_ready()?;
        self.pairs.push(PairReport { quiet, ready });

        self.enter(SyncState::Flushing);
        self.engine.flush()?;

        self.enter(SyncState::FactoryResetting);
        let timeout = self.engine.config().command_timeout;
        let ack = self
            .engine
            .send_command(&Command::FactoryReset.to_command_string(), timeout, false)?;
        debug!(ack = ?ack, "factory reset acknowledged");

        for pair in 2..=self.config.readiness_pairs {
            self.enter(SyncState::AwaitingReady2);
            debug!(pair, "waiting for reboot");
            let quiet = self.await_quiet()?;
            let ready = self.await_ready()?;
            self.pairs.push(PairReport { quiet, ready });
        }

        self.engine.flush()?;
        let status = self
            .engine
            .send_command(&Command::EventQuery.to_command_string(), timeout, false)?;
        if status != self.config.startup_signature {
            match Event::parse(&status) {
                Ok(Some(event)) if event.is_startup() => {
                    warn!(param = event.param, "startup event with unexpected parameter")
                }
                Ok(Some(event)) => warn!(id = event.id, param = event.param, "module reported another event"),
                Ok(None) => warn!("no event pending after reboot"),
                Err(e) => warn!(error = %e, "unreadable event reply"),
            }
            return Err(EngineError::SyncVerificationFailed {
                expected: self.config.startup_signature.clone(),
                actual: status,
            });
        }

        self.enter(SyncState::Synchronized);
        Ok(())
    }

    fn enter(&mut self, next: SyncState) {
        debug!(from = %self.state, to = %next, "sync transition");
        self.state = next;
    }

    /// Best-effort wait for the event line to go inactive.
    fn await_quiet(&mut self) -> EngineResult<Option<Duration>> {
        match self.wait_for_event(false, self.config.quiet_timeout) {
            Ok(waited) => Ok(Some(waited)),
            Err(PollError::TimedOut { elapsed }) => {
                warn!(state = %self.state, ?elapsed, "event line never went quiet, continuing");
                Ok(None)
            }
            Err(PollError::Failed(e)) => Err(e.into()),
        }
    }

    /// Mandatory wait for the event line to go active.
    fn await_ready(&mut self) -> EngineResult<Duration> {
        match self.wait_for_event(true, self.config.ready_timeout) {
            Ok(waited) => {
                debug!(state = %self.state, ?waited, "event line active");
                Ok(waited)
            }
            Err(PollError::TimedOut { elapsed }) => Err(EngineError::SyncTimeout {
                state: self.state,
                waited: elapsed,
            }),
            Err(PollError::Failed(e)) => Err(e.into()),
        }
    }

    fn wait_for_event(
        &mut self,
        active: bool,
        timeout: Duration,
    ) -> Result<Duration, PollError<TransportError>> {
        let start = Instant::now();
        let transport = self.engine.transport_mut();
        poll_until(self.config.ready_poll, timeout, || {
            let level = transport.get_line(ControlLine::Event)?;
            Ok((level == active).then(|| start.elapsed()))
        })
    }

    /// Leave the lines in a defined state after a failure.
    fn park(&mut self) {
        let transport = self.engine.transport_mut();
        for (line, asserted) in [(ControlLine::Reset, false), (ControlLine::Wake, true)] {
            if let Err(e) = transport.set_line(line, asserted) {
                warn!(%line, error = %e, "could not park control line");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(SyncState::AwaitingReady2.to_string(), "AWAITING_READY_2");
        assert_eq!(SyncState::Synchronized.as_str(), "SYNCHRONIZED");
    }
}
