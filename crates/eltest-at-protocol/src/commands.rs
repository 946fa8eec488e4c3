//! Commands that can be sent to an ExpressLink module.
//!
//! Only the commands needed to synchronize with a module and to read or
//! write its configuration are modelled; anything else can be sent as
//! free text through the engine.

use crate::codec::{terminate_command, TERMINATOR};
use crate::error::{AtError, AtResult};

/// Configuration keys read with `AT+CONF?` and written with `AT+CONF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfKey {
    /// Firmware version (`Version`)
    Version,
    /// Technical specification version implemented (`TechSpec`)
    TechSpec,
    /// Thing name used in the cloud (`ThingName`)
    ThingName,
    /// Vendor and model description (`About`)
    About,
    /// Device certificate (`Certificate`)
    Certificate,
    /// Cloud endpoint (`Endpoint`)
    Endpoint,
    /// Server root CA certificate (`RootCA`)
    RootCa,
    /// OTA signing certificate (`OTAcertificate`)
    OtaCertificate,
    /// Wi-Fi network name (`SSID`)
    Ssid,
    /// Wi-Fi passphrase (`Passphrase`)
    Passphrase,
    /// Cellular access point name (`APN`)
    Apn,
}

impl ConfKey {
    /// Get the key string used in commands.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfKey::Version => "Version",
            ConfKey::TechSpec => "TechSpec",
            ConfKey::ThingName => "ThingName",
            ConfKey::About => "About",
            ConfKey::Certificate => "Certificate",
            ConfKey::Endpoint => "Endpoint",
            ConfKey::RootCa => "RootCA",
            ConfKey::OtaCertificate => "OTAcertificate",
            ConfKey::Ssid => "SSID",
            ConfKey::Passphrase => "Passphrase",
            ConfKey::Apn => "APN",
        }
    }
}

/// A command for the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Restore factory configuration and reboot (`AT+FACTORY_RESET`).
    FactoryReset,

    /// Pop the next pending event (`AT+EVENT?`).
    EventQuery,

    /// Read a configuration value (`AT+CONF? <key>`).
    ConfQuery(ConfKey),

    /// Write a single-line configuration value (`AT+CONF <key>=<value>`).
    ConfSet {
        /// Key to write.
        key: ConfKey,
        /// New value; never contains a newline.
        value: String,
    },

    /// Upload a PEM document (`AT+CONF <key>=pem` followed by the PEM text).
    ConfPem {
        /// Certificate key (`RootCA`, `OTAcertificate`, ...).
        key: ConfKey,
        /// PEM text, newlines included.
        pem: String,
    },
}

impl Command {
    /// Build a single-line configuration write.
    ///
    /// Fails if the value contains the response terminator, which would
    /// split the command in two.
    pub fn conf_set(key: ConfKey, value: impl Into<String>) -> AtResult<Command> {
        let value = value.into();
        if value.bytes().any(|b| b == TERMINATOR || b == b'\r') {
            return Err(AtError::InvalidCommand(format!(
                "value for {} contains a line break",
                key.as_str()
            )));
        }
        Ok(Command::ConfSet { key, value })
    }

    /// Build a PEM upload.
    pub fn conf_pem(key: ConfKey, pem: impl Into<String>) -> AtResult<Command> {
        let pem = pem.into();
        if !pem.contains("-----BEGIN ") {
            return Err(AtError::InvalidCommand(format!(
                "{} payload is not a PEM document",
                key.as_str()
            )));
        }
        Ok(Command::ConfPem { key, pem })
    }

    /// Render the command text, line ending included.
    pub fn to_command_string(&self) -> String {
        let body = match self {
            Command::FactoryReset => "AT+FACTORY_RESET".to_string(),
            Command::EventQuery => "AT+EVENT?".to_string(),
            Command::ConfQuery(key) => format!("AT+CONF? {}", key.as_str()),
            Command::ConfSet { key, value } => format!("AT+CONF {}={}", key.as_str(), value),
            // The PEM's own final newline terminates the command.
            Command::ConfPem { key, pem } => format!("AT+CONF {}=pem\n{}", key.as_str(), pem),
        };
        terminate_command(&body)
    }
}
