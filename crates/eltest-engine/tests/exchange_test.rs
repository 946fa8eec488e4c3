//! Command exchange against a scripted device.

use eltest_at_protocol::decode_latin1;
use eltest_engine::{CommandObserver, EngineConfig, EngineError, ProtocolEngine};
use eltest_transport::mock::{MockAction, MockTransport};
use eltest_transport::TransportError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_millis(500);

/// Allowance for the OS scheduler on top of one poll interval.
const SCHEDULER_SLACK: Duration = Duration::from_millis(15);

fn engine(mock: &MockTransport) -> ProtocolEngine<MockTransport> {
    ProtocolEngine::new(mock.clone(), EngineConfig::default()).expect("valid config")
}

/// Device that answers every request after `delay` with `reply`.
fn replying_device(reply: &'static [u8], delay: Duration) -> MockTransport {
    let mock = MockTransport::new();
    mock.on_write(move |_, device| device.schedule(delay, MockAction::Emit(reply.to_vec())));
    mock
}

#[derive(Clone, Default)]
struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl CommandObserver for RecordingObserver {
    fn on_request(&mut self, request: &str) {
        self.events.lock().unwrap().push(format!("request {}", request.trim_end()));
    }

    fn on_poll(&mut self) {
        self.events.lock().unwrap().push("poll".to_string());
    }

    fn on_response(&mut self, request: &str, response: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("response {} -> {}", request.trim_end(), response.trim_end()));
    }

    fn on_timeout(&mut self, _request: &str, partial: &str) {
        self.events.lock().unwrap().push(format!("timeout {}", partial));
    }
}

#[test]
fn test_response_returned_exactly_up_to_terminator() {
    let mock = replying_device(b"OK 2 0 STARTUP\r\nEXTRA", Duration::from_millis(30));
    let mut engine = engine(&mock);

    let response = engine.send_command("AT+EVENT?\r\n", TIMEOUT, false).unwrap();
    assert_eq!(response, "OK 2 0 STARTUP\r\n");
    assert_eq!(decode_latin1(&mock.written()), "AT+EVENT?\r\n");

    // The trailing bytes belong to the next line.
    mock.emit(b"\n");
    assert_eq!(engine.wait_for_line(TIMEOUT).unwrap(), "EXTRA\n");
}

#[test]
fn test_response_assembled_from_chunks() {
    let mock = MockTransport::new();
    mock.on_write(|_, device| {
        device.schedule(Duration::from_millis(20), MockAction::Emit(b"OK v".to_vec()));
        device.schedule(Duration::from_millis(60), MockAction::Emit(b"2.4".to_vec()));
        device.schedule(Duration::from_millis(90), MockAction::Emit(b".1\r\n".to_vec()));
    });
    let mut engine = engine(&mock);

    let response = engine.send_command("AT+CONF? Version\r\n", TIMEOUT, false).unwrap();
    assert_eq!(response, "OK v2.4.1\r\n");
}

#[test]
fn test_timeout_not_early_and_bounded() {
    let mock = replying_device(b"OK partial", Duration::from_millis(10));
    let mut engine = engine(&mock);
    let timeout = Duration::from_millis(200);

    let start = Instant::now();
    let err = engine.send_command("AT+CONF? About\r\n", timeout, false).unwrap_err();
    let elapsed = start.elapsed();

    match err {
        EngineError::ProtocolTimeout { timeout: t, partial } => {
            assert_eq!(t, timeout);
            assert_eq!(partial, "OK partial");
        }
        other => panic!("expected ProtocolTimeout, got {:?}", other),
    }
    assert!(elapsed >= timeout, "timed out early after {:?}", elapsed);
    let bound = timeout + EngineConfig::default().command_poll + SCHEDULER_SLACK;
    assert!(elapsed < bound, "overshoot {:?}", elapsed);
}

#[test]
fn test_timeout_with_silent_device() {
    let mock = MockTransport::new();
    let mut engine = engine(&mock);

    let err = engine
        .send_command("AT\r\n", Duration::from_millis(50), false)
        .unwrap_err();
    assert!(matches!(err, EngineError::ProtocolTimeout { ref partial, .. } if partial.is_empty()));
}

#[test]
fn test_partial_data_does_not_leak_into_next_exchange() {
    let mock = MockTransport::new();
    mock.emit(b"garbage without end");
    let mut engine = engine(&mock);

    assert!(engine.wait_for_line(Duration::from_millis(30)).is_err());

    mock.emit(b"OK\r\n");
    assert_eq!(engine.wait_for_line(TIMEOUT).unwrap(), "OK\r\n");
}

#[test]
fn test_bare_newline_mid_response_ends_response() {
    // A firmware bug emitting a bare newline mid-response is taken as the
    // end of the response; the rest arrives as a separate line.
    let mock = MockTransport::new();
    mock.on_write(|_, device| {
        device.emit(b"OK first\n");
        device.schedule(Duration::from_millis(50), MockAction::Emit(b"second\r\n".to_vec()));
    });
    let mut engine = engine(&mock);

    assert_eq!(engine.send_command("AT+DIAG\r\n", TIMEOUT, false).unwrap(), "OK first\n");
    assert_eq!(engine.wait_for_line(TIMEOUT).unwrap(), "second\r\n");
}

#[test]
fn test_echo_reaches_observer() {
    let mock = replying_device(b"OK\r\n", Duration::from_millis(25));
    let observer = RecordingObserver::default();
    let mut engine = engine(&mock).with_observer(observer.clone());

    engine.send_command("AT\r\n", TIMEOUT, true).unwrap();

    let events = observer.events();
    assert_eq!(events.first().map(String::as_str), Some("request AT"));
    assert_eq!(events.last().map(String::as_str), Some("response AT -> OK"));
    assert!(events.iter().filter(|e| *e == "poll").count() >= 2);
}

#[test]
fn test_echo_reports_timeout() {
    let mock = replying_device(b"OK", Duration::ZERO);
    let observer = RecordingObserver::default();
    let mut engine = engine(&mock).with_observer(observer.clone());

    assert!(engine.send_command("AT\r\n", Duration::from_millis(30), true).is_err());
    assert_eq!(observer.events().last().map(String::as_str), Some("timeout OK"));
}

#[test]
fn test_no_echo_keeps_observer_silent() {
    let mock = replying_device(b"OK\r\n", Duration::ZERO);
    let observer = RecordingObserver::default();
    let mut engine = engine(&mock).with_observer(observer.clone());

    engine.send_command("AT\r\n", TIMEOUT, false).unwrap();
    assert!(observer.events().is_empty());
}

#[test]
fn test_transport_error_propagates() {
    let mock = MockTransport::new();
    mock.schedule(Duration::from_millis(20), MockAction::Disconnect);
    let mut engine = engine(&mock);

    let err = engine.send_command("AT\r\n", TIMEOUT, false).unwrap_err();
    assert!(matches!(err, EngineError::Transport(TransportError::Disconnected)));
}

#[test]
fn test_payload_encoded_as_latin1() {
    let mock = replying_device(b"OK\r\n", Duration::ZERO);
    let mut engine = engine(&mock);

    engine.send_command("AT+CONF About=caf\u{e9} \u{20ac}\r\n", TIMEOUT, false).unwrap();
    assert_eq!(
        mock.written(),
        b"AT+CONF About=caf\xe9 ?\r\n".to_vec()
    );
}
