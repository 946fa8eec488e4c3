//! Configuration queries and writes on a synchronized module.

use crate::engine::ProtocolEngine;
use crate::error::{EngineError, EngineResult};
use eltest_at_protocol::{Command, ConfKey, Response};
use eltest_transport::Transport;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identity of a module, as reported by its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Firmware version.
    pub device_version: String,
    /// Technical specification implemented.
    pub device_techspec: String,
    /// Thing name.
    pub thing_name: String,
    /// Vendor/model description.
    pub about: String,
    /// Device certificate.
    pub certificate: String,
    /// Cloud endpoint.
    pub staging_endpoint: String,
}

impl<T: Transport> ProtocolEngine<T> {
    /// Read one configuration value.
    ///
    /// The reply must be `OK <value>`; the value is returned without the
    /// prefix and line ending.
    pub fn query_conf(&mut self, key: ConfKey) -> EngineResult<String> {
        let command = Command::ConfQuery(key);
        let raw = self.command(&command)?;
        match Response::parse(&raw) {
            Ok(Response::OkPayload(value)) => Ok(value),
            _ => Err(EngineError::UnexpectedResponse {
                command: command.to_command_string(),
                response: raw,
            }),
        }
    }

    /// Query the identity of the module.
    pub fn device_info(&mut self) -> EngineResult<DeviceInfo> {
        let info = DeviceInfo {
            device_version: self.query_conf(ConfKey::Version)?,
            device_techspec: self.query_conf(ConfKey::TechSpec)?,
            thing_name: self.query_conf(ConfKey::ThingName)?,
            about: self.query_conf(ConfKey::About)?,
            certificate: self.query_conf(ConfKey::Certificate)?,
            staging_endpoint: self.query_conf(ConfKey::Endpoint)?,
        };
        debug!(thing = %info.thing_name, version = %info.device_version, "read device info");
        Ok(info)
    }

    /// Send a configuration write and require a success reply.
    ///
    /// `echo` forwards the exchange to the observer.
    pub fn write_conf(&mut self, command: &Command, echo: bool) -> EngineResult<String> {
        let text = command.to_command_string();
        let timeout = self.config().command_timeout;
        let raw = self.send_command(&text, timeout, echo)?;
        match Response::parse(&raw) {
            Ok(response) if response.is_ok() => Ok(raw),
            _ => Err(EngineError::UnexpectedResponse {
                command: text,
                response: raw,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use eltest_at_protocol::decode_latin1;
    use eltest_transport::mock::MockTransport;

    fn conf_device() -> MockTransport {
        let mock = MockTransport::new();
        mock.on_write(|data, device| {
            let reply: &[u8] = match decode_latin1(data).as_str() {
                "AT+CONF? Version\r\n" => b"OK v2.4.1\r\n",
                "AT+CONF? TechSpec\r\n" => b"OK v1.2\r\n",
                "AT+CONF? ThingName\r\n" => b"OK 0123456789abcdef\r\n",
                "AT+CONF? About\r\n" => b"OK Vendor Module\r\n",
                "AT+CONF? Certificate\r\n" => b"OK pem\r\n",
                "AT+CONF? Endpoint\r\n" => b"OK example-ats.iot.us-west-2.amazonaws.com\r\n",
                "AT+CONF SSID=lab\r\n" => b"OK\r\n",
                _ => b"ERR3 INVALID COMMAND\r\n",
            };
            device.emit(reply);
        });
        mock
    }

    #[test]
    fn test_device_info() {
        let mock = conf_device();
        let mut engine = ProtocolEngine::new(mock.clone(), EngineConfig::default()).unwrap();

        let info = engine.device_info().unwrap();
        assert_eq!(info.device_version, "v2.4.1");
        assert_eq!(info.device_techspec, "v1.2");
        assert_eq!(info.thing_name, "0123456789abcdef");
        assert_eq!(info.about, "Vendor Module");
        assert_eq!(info.staging_endpoint, "example-ats.iot.us-west-2.amazonaws.com");
        assert!(mock.written_text().starts_with("AT+CONF? Version\r\nAT+CONF? TechSpec\r\n"));
    }

    #[test]
    fn test_query_conf_error_reply() {
        let mock = conf_device();
        let mut engine = ProtocolEngine::new(mock, EngineConfig::default()).unwrap();

        let err = engine.query_conf(ConfKey::Apn).unwrap_err();
        match err {
            EngineError::UnexpectedResponse { command, response } => {
                assert_eq!(command, "AT+CONF? APN\r\n");
                assert_eq!(response, "ERR3 INVALID COMMAND\r\n");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_write_conf() {
        let mock = conf_device();
        let mut engine = ProtocolEngine::new(mock, EngineConfig::default()).unwrap();

        let ok = Command::conf_set(ConfKey::Ssid, "lab").unwrap();
        assert_eq!(engine.write_conf(&ok, false).unwrap(), "OK\r\n");

        let rejected = Command::conf_set(ConfKey::Ssid, "other").unwrap();
        assert!(matches!(
            engine.write_conf(&rejected, false),
            Err(EngineError::UnexpectedResponse { .. })
        ));
    }
}
