//! Response parsing for the AT protocol.
//!
//! Every response is a single line:
//! - `OK` or `OK <payload>` on success
//! - `ERR<code> <message>` on failure
//!
//! Event queries answer `OK <id> <param> <mnemonic>` when an event is
//! pending and a bare `OK` otherwise.

use crate::error::{AtError, AtResult};

/// Event identifier the module reports after a clean boot.
pub const STARTUP_EVENT_ID: u16 = 2;

/// Parsed response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Bare `OK`.
    Ok,

    /// `OK` followed by a payload (the separating space is stripped).
    OkPayload(String),

    /// `ERR<code> <message>`.
    Error {
        /// Numeric error code.
        code: u16,
        /// Error text, possibly empty.
        message: String,
    },

    /// Anything else.
    Unknown(String),
}

impl Response {
    /// Parse a response line. The trailing line ending is ignored.
    pub fn parse(text: &str) -> AtResult<Response> {
        let text = text.trim_end_matches(['\r', '\n']);

        if text == "OK" {
            return Ok(Response::Ok);
        }

        if let Some(payload) = text.strip_prefix("OK ") {
            return Ok(Response::OkPayload(payload.to_string()));
        }

        if let Some(rest) = text.strip_prefix("ERR") {
            let (code, message) = rest.split_once(' ').unwrap_or((rest, ""));
            let code: u16 = code
                .parse()
                .map_err(|_| AtError::ParseError(format!("invalid error code: {:?}", code)))?;
            return Ok(Response::Error {
                code,
                message: message.to_string(),
            });
        }

        Ok(Response::Unknown(text.to_string()))
    }

    /// Check if this is a success response.
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok | Response::OkPayload(_))
    }

    /// Get the payload of an `OK <payload>` response.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Response::OkPayload(p) => Some(p),
            _ => None,
        }
    }

    /// Turn an `ERR` response into an error.
    pub fn into_result(self) -> AtResult<Response> {
        match self {
            Response::Error { code, message } => Err(AtError::ModuleError { code, message }),
            other => Ok(other),
        }
    }
}

/// An event reported by `AT+EVENT?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event identifier.
    pub id: u16,
    /// Event parameter.
    pub param: u32,
    /// Human-readable mnemonic, if the module sent one.
    pub mnemonic: Option<String>,
}

impl Event {
    /// Parse the reply to an event query.
    ///
    /// Returns `Ok(None)` for a bare `OK` (no event pending).
    pub fn parse(text: &str) -> AtResult<Option<Event>> {
        match Response::parse(text)?.into_result()? {
            Response::Ok => Ok(None),
            Response::OkPayload(payload) => {
                let mut parts = payload.splitn(3, ' ');
                let id: u16 = parts
                    .next()
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(|| AtError::ParseError(format!("invalid event id: {}", payload)))?;
                let param: u32 = parts
                    .next()
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(|| {
                        AtError::ParseError(format!("invalid event parameter: {}", payload))
                    })?;
                let mnemonic = parts.next().map(|m| m.to_string());
                Ok(Some(Event { id, param, mnemonic }))
            }
            other => Err(AtError::ParseError(format!(
                "unexpected event response: {:?}",
                other
            ))),
        }
    }

    /// Whether this is the clean-boot event.
    pub fn is_startup(&self) -> bool {
        self.id == STARTUP_EVENT_ID
    }
}
