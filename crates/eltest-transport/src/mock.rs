//! Scripted in-memory device for tests.
//!
//! A [`MockTransport`] shares its state with every clone, so a test can keep
//! one handle for inspection while the engine owns another. Device behaviour
//! is scripted with hooks that react to writes and line changes, and with
//! actions scheduled to fire after a delay. Scheduled actions are applied
//! lazily whenever the transport is touched.

use crate::error::{TransportError, TransportResult};
use crate::lines::ControlLine;
use crate::Transport;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Hook called with every chunk the host writes.
pub type WriteHook = Box<dyn FnMut(&[u8], &mut MockDevice) + Send>;

/// Hook called whenever the host drives an output line.
pub type LineHook = Box<dyn FnMut(ControlLine, bool, &mut MockDevice) + Send>;

/// Something the simulated device does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    /// Make bytes available to the host.
    Emit(Vec<u8>),
    /// Drive the event line.
    SetEvent(bool),
    /// Drop the link; every later operation fails.
    Disconnect,
}

/// Device-side state of the mock.
#[derive(Debug)]
pub struct MockDevice {
    rx: VecDeque<u8>,
    written: Vec<u8>,
    wake: bool,
    reset: bool,
    event: bool,
    history: Vec<(ControlLine, bool)>,
    scheduled: Vec<(Instant, MockAction)>,
    connected: bool,
    flushes: usize,
}

impl MockDevice {
    fn new() -> Self {
        MockDevice {
            rx: VecDeque::new(),
            written: Vec::new(),
            wake: false,
            reset: false,
            event: false,
            history: Vec::new(),
            scheduled: Vec::new(),
            connected: true,
            flushes: 0,
        }
    }

    /// Make bytes available to the host.
    pub fn emit(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Drive the event line.
    pub fn set_event(&mut self, active: bool) {
        self.event = active;
    }

    /// Run an action after a delay.
    pub fn schedule(&mut self, after: Duration, action: MockAction) {
        self.scheduled.push((Instant::now() + after, action));
    }

    /// Drop all pending scheduled actions.
    pub fn cancel_scheduled(&mut self) {
        self.scheduled.clear();
    }

    /// Drop the link.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Current logical value of a line.
    pub fn line(&self, line: ControlLine) -> bool {
        match line {
            ControlLine::Wake => self.wake,
            ControlLine::Reset => self.reset,
            ControlLine::Event => self.event,
        }
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    fn apply(&mut self, action: MockAction) {
        match action {
            MockAction::Emit(bytes) => self.emit(&bytes),
            MockAction::SetEvent(active) => self.set_event(active),
            MockAction::Disconnect => self.disconnect(),
        }
    }

    fn run_due(&mut self, now: Instant) {
        self.scheduled.sort_by_key(|(at, _)| *at);
        while self.scheduled.first().is_some_and(|(at, _)| *at <= now) {
            let (_, action) = self.scheduled.remove(0);
            self.apply(action);
        }
    }
}

struct Shared {
    device: MockDevice,
    on_write: Option<WriteHook>,
    on_line: Option<LineHook>,
}

impl Shared {
    /// Apply due actions and fail if the link is gone.
    fn touch(&mut self) -> TransportResult<()> {
        self.device.run_due(Instant::now());
        if self.device.connected {
            Ok(())
        } else {
            Err(TransportError::Disconnected)
        }
    }
}

/// A scripted [`Transport`]. Clones share the same device.
#[derive(Clone)]
pub struct MockTransport {
    shared: Arc<Mutex<Shared>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock with all lines deasserted and nothing to read.
    pub fn new() -> Self {
        MockTransport {
            shared: Arc::new(Mutex::new(Shared {
                device: MockDevice::new(),
                on_write: None,
                on_line: None,
            })),
        }
    }

    /// Install the hook called on every write.
    pub fn on_write<F>(&self, hook: F)
    where
        F: FnMut(&[u8], &mut MockDevice) + Send + 'static,
    {
        self.shared.lock().on_write = Some(Box::new(hook));
    }

    /// Install the hook called on every output line change.
    pub fn on_line<F>(&self, hook: F)
    where
        F: FnMut(ControlLine, bool, &mut MockDevice) + Send + 'static,
    {
        self.shared.lock().on_line = Some(Box::new(hook));
    }

    /// Run a closure against the device state.
    pub fn with_device<R>(&self, f: impl FnOnce(&mut MockDevice) -> R) -> R {
        let mut shared = self.shared.lock();
        shared.device.run_due(Instant::now());
        f(&mut shared.device)
    }

    /// Make bytes available to the host.
    pub fn emit(&self, bytes: &[u8]) {
        self.with_device(|d| d.emit(bytes));
    }

    /// Drive the event line.
    pub fn set_event(&self, active: bool) {
        self.with_device(|d| d.set_event(active));
    }

    /// Run an action after a delay.
    pub fn schedule(&self, after: Duration, action: MockAction) {
        self.with_device(|d| d.schedule(after, action));
    }

    /// Drop the link.
    pub fn disconnect(&self) {
        self.with_device(|d| d.disconnect());
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.with_device(|d| d.written().to_vec())
    }

    /// Everything the host has written, decoded as ISO-8859-1.
    pub fn written_text(&self) -> String {
        self.written().iter().map(|&b| b as char).collect()
    }

    /// Current logical value of a line.
    pub fn line(&self, line: ControlLine) -> bool {
        self.with_device(|d| d.line(line))
    }

    /// Every output line change, in order.
    pub fn line_history(&self) -> Vec<(ControlLine, bool)> {
        self.with_device(|d| d.history.clone())
    }

    /// Number of input flushes requested by the host.
    pub fn flush_count(&self) -> usize {
        self.with_device(|d| d.flushes)
    }
}

impl Transport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<()> {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;
        shared.touch()?;
        shared.device.written.extend_from_slice(bytes);
        if let Some(hook) = shared.on_write.as_mut() {
            hook(bytes, &mut shared.device);
        }
        Ok(())
    }

    fn read_available(&mut self) -> TransportResult<Vec<u8>> {
        let mut shared = self.shared.lock();
        shared.touch()?;
        Ok(shared.device.rx.drain(..).collect())
    }

    fn set_line(&mut self, line: ControlLine, asserted: bool) -> TransportResult<()> {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;
        shared.touch()?;
        match line {
            ControlLine::Wake => shared.device.wake = asserted,
            ControlLine::Reset => shared.device.reset = asserted,
            ControlLine::Event => return Err(TransportError::ReadOnlyLine(line)),
        }
        shared.device.history.push((line, asserted));
        if let Some(hook) = shared.on_line.as_mut() {
            hook(line, asserted, &mut shared.device);
        }
        Ok(())
    }

    fn get_line(&mut self, line: ControlLine) -> TransportResult<bool> {
        let mut shared = self.shared.lock();
        shared.touch()?;
        Ok(shared.device.line(line))
    }

    fn flush_input(&mut self) -> TransportResult<()> {
        let mut shared = self.shared.lock();
        shared.touch()?;
        shared.device.rx.clear();
        shared.device.flushes += 1;
        Ok(())
    }
}
