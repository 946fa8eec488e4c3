//! Progress reporting for echoed command exchanges.
//!
//! Observers only see exchanges sent with `echo` set. They are for people
//! watching a terminal; the engine never consults them.

use std::io::{self, Write};

/// Receives progress of echoed command exchanges.
pub trait CommandObserver {
    /// A request is about to be waited on (empty when only waiting).
    fn on_request(&mut self, _request: &str) {}

    /// One poll iteration finished.
    fn on_poll(&mut self) {}

    /// A complete response arrived.
    fn on_response(&mut self, _request: &str, _response: &str) {}

    /// The exchange timed out with `partial` received.
    fn on_timeout(&mut self, _request: &str, _partial: &str) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl CommandObserver for SilentObserver {}

/// Prints requests, a dot per poll, and responses.
///
/// ```text
/// Command:  "AT+CONF? Version\r\n"....
/// Response: "OK v2.4.1\r\n"
/// ```
pub struct ConsoleObserver<W: Write> {
    out: W,
}

impl ConsoleObserver<io::Stdout> {
    /// Print to standard output.
    pub fn stdout() -> Self {
        ConsoleObserver { out: io::stdout() }
    }
}

impl<W: Write> ConsoleObserver<W> {
    /// Print to any writer.
    pub fn new(out: W) -> Self {
        ConsoleObserver { out }
    }

    /// Get the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }
}

// Output is cosmetic: write failures are ignored.
impl<W: Write> CommandObserver for ConsoleObserver<W> {
    fn on_request(&mut self, request: &str) {
        let _ = write!(self.out, "Command:  {:?}", request);
        let _ = self.out.flush();
    }

    fn on_poll(&mut self) {
        let _ = write!(self.out, ".");
        let _ = self.out.flush();
    }

    fn on_response(&mut self, _request: &str, response: &str) {
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "Response: {:?}", response);
        let _ = writeln!(self.out);
    }

    fn on_timeout(&mut self, _request: &str, partial: &str) {
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "Timed out, received: {:?}", partial);
        let _ = writeln!(self.out);
    }
}
