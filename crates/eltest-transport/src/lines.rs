//! Control-line model and modem-signal bindings.

use crate::error::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three auxiliary lines between host and module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlLine {
    /// Keeps the module awake (output).
    Wake,
    /// Module reset control (output).
    Reset,
    /// Readiness/event signal from the module (input).
    Event,
}

impl ControlLine {
    /// All lines, in a fixed order.
    pub const ALL: [ControlLine; 3] = [ControlLine::Wake, ControlLine::Reset, ControlLine::Event];

    /// Get the line name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlLine::Wake => "wake",
            ControlLine::Reset => "reset",
            ControlLine::Event => "event",
        }
    }

    /// Whether the host drives this line.
    pub fn is_output(&self) -> bool {
        !matches!(self, ControlLine::Event)
    }
}

impl fmt::Display for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlLine {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wake" => Ok(ControlLine::Wake),
            "reset" => Ok(ControlLine::Reset),
            "event" => Ok(ControlLine::Event),
            other => Err(TransportError::UnknownLine(other.to_string())),
        }
    }
}

/// RS-232 modem signals available on a serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModemSignal {
    /// Data Terminal Ready (output).
    Dtr,
    /// Request To Send (output).
    Rts,
    /// Clear To Send (input).
    Cts,
    /// Data Set Ready (input).
    Dsr,
    /// Ring Indicator (input).
    Ri,
    /// Carrier Detect (input).
    Cd,
}

impl ModemSignal {
    /// Whether the host drives this signal.
    pub fn is_output(&self) -> bool {
        matches!(self, ModemSignal::Dtr | ModemSignal::Rts)
    }
}

impl fmt::Display for ModemSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModemSignal::Dtr => "DTR",
            ModemSignal::Rts => "RTS",
            ModemSignal::Cts => "CTS",
            ModemSignal::Dsr => "DSR",
            ModemSignal::Ri => "RI",
            ModemSignal::Cd => "CD",
        };
        f.write_str(name)
    }
}

/// Binding of one control line onto a modem signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBinding {
    /// The modem signal carrying the line.
    pub signal: ModemSignal,
    /// Asserted means the signal is driven/read low.
    #[serde(default)]
    pub active_low: bool,
}

impl LineBinding {
    /// Create an active-high binding.
    pub fn active_high(signal: ModemSignal) -> Self {
        LineBinding { signal, active_low: false }
    }

    /// Convert a logical value to the physical signal level.
    pub fn to_level(&self, asserted: bool) -> bool {
        asserted != self.active_low
    }

    /// Convert a physical signal level to the logical value.
    pub fn from_level(&self, level: bool) -> bool {
        level != self.active_low
    }
}

/// Where each control line lives on the serial port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineMap {
    /// Binding for the wake line.
    pub wake: LineBinding,
    /// Binding for the reset line.
    pub reset: LineBinding,
    /// Binding for the event line.
    pub event: LineBinding,
}

impl Default for LineMap {
    fn default() -> Self {
        LineMap {
            wake: LineBinding::active_high(ModemSignal::Dtr),
            reset: LineBinding::active_high(ModemSignal::Rts),
            event: LineBinding::active_high(ModemSignal::Cts),
        }
    }
}

impl LineMap {
    /// Get the binding for a line.
    pub fn binding(&self, line: ControlLine) -> LineBinding {
        match line {
            ControlLine::Wake => self.wake,
            ControlLine::Reset => self.reset,
            ControlLine::Event => self.event,
        }
    }

    /// Check that every line is bound to a signal of matching direction
    /// and that the two outputs do not share a signal.
    pub fn validate(&self) -> TransportResult<()> {
        for line in ControlLine::ALL {
            let binding = self.binding(line);
            if binding.signal.is_output() != line.is_output() {
                return Err(TransportError::InvalidBinding {
                    line,
                    signal: binding.signal,
                });
            }
        }
        if self.wake.signal == self.reset.signal {
            return Err(TransportError::InvalidBinding {
                line: ControlLine::Reset,
                signal: self.reset.signal,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_names() {
        assert_eq!("wake".parse::<ControlLine>().unwrap(), ControlLine::Wake);
        assert_eq!("reset".parse::<ControlLine>().unwrap(), ControlLine::Reset);
        assert_eq!("event".parse::<ControlLine>().unwrap(), ControlLine::Event);
    }

    #[test]
    fn test_unknown_line_name() {
        let err = "power".parse::<ControlLine>().unwrap_err();
        assert!(matches!(err, TransportError::UnknownLine(name) if name == "power"));
    }

    #[test]
    fn test_active_low_polarity() {
        let binding = LineBinding { signal: ModemSignal::Rts, active_low: true };
        assert!(!binding.to_level(true));
        assert!(binding.to_level(false));
        assert!(binding.from_level(false));
    }

    #[test]
    fn test_default_map_is_valid() {
        assert!(LineMap::default().validate().is_ok());
    }

    #[test]
    fn test_event_on_output_signal_rejected() {
        let map = LineMap {
            event: LineBinding::active_high(ModemSignal::Dtr),
            ..LineMap::default()
        };
        assert!(matches!(
            map.validate(),
            Err(TransportError::InvalidBinding { line: ControlLine::Event, .. })
        ));
    }

    #[test]
    fn test_shared_output_signal_rejected() {
        let map = LineMap {
            reset: LineBinding::active_high(ModemSignal::Dtr),
            ..LineMap::default()
        };
        assert!(map.validate().is_err());
    }
}
