//! Engine configuration.
//!
//! Durations are written in milliseconds in configuration files
//! (`command_timeout_ms: 120000`).

use crate::error::{EngineError, EngineResult};
use eltest_at_protocol::TERMINATOR;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status reply of a module that started up cleanly.
pub const STARTUP_SIGNATURE: &str = "OK 2 0 STARTUP\r\n";

/// Timing of the command exchange and the reset sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Poll interval while waiting for a response.
    #[serde(rename = "command_poll_ms", with = "duration_ms")]
    pub command_poll: Duration,
    /// Timeout for commands that do not specify one.
    #[serde(rename = "command_timeout_ms", with = "duration_ms")]
    pub command_timeout: Duration,
    /// Reset/synchronization settings.
    pub sync: SyncConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            command_poll: Duration::from_millis(10),
            command_timeout: Duration::from_secs(120),
            sync: SyncConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.command_poll.is_zero() {
            return Err(EngineError::InvalidConfig(
                "command_poll_ms must be positive".to_string(),
            ));
        }
        self.sync.validate()
    }
}

/// Settings of the reset/synchronization sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Pause after asserting wake and releasing reset.
    #[serde(rename = "settle_ms", with = "duration_ms")]
    pub settle: Duration,
    /// Best-effort wait for the event line to go inactive.
    #[serde(rename = "quiet_timeout_ms", with = "duration_ms")]
    pub quiet_timeout: Duration,
    /// Mandatory wait for the event line to go active.
    #[serde(rename = "ready_timeout_ms", with = "duration_ms")]
    pub ready_timeout: Duration,
    /// Poll interval for the event line.
    #[serde(rename = "ready_poll_ms", with = "duration_ms")]
    pub ready_poll: Duration,
    /// Number of quiet/ready wait pairs: one around the reset assertion,
    /// the rest after the factory reset.
    pub readiness_pairs: usize,
    /// Exact reply to the status query that proves a clean startup.
    pub startup_signature: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            settle: Duration::from_secs(1),
            quiet_timeout: Duration::from_secs(10),
            ready_timeout: Duration::from_secs(120),
            ready_poll: Duration::from_millis(100),
            readiness_pairs: 2,
            startup_signature: STARTUP_SIGNATURE.to_string(),
        }
    }
}

impl SyncConfig {
    /// Reject settings the sequence cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.readiness_pairs < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "readiness_pairs must be at least 2, got {}",
                self.readiness_pairs
            )));
        }
        if self.ready_poll.is_zero() {
            return Err(EngineError::InvalidConfig(
                "ready_poll_ms must be positive".to_string(),
            ));
        }
        if self.startup_signature.as_bytes().last() != Some(&TERMINATOR) {
            return Err(EngineError::InvalidConfig(
                "startup_signature must end with a newline".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.command_poll, Duration::from_millis(10));
        assert_eq!(config.sync.ready_poll, Duration::from_millis(100));
        assert_eq!(config.sync.readiness_pairs, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_with_partial_overrides() {
        let yaml = r#"
command_timeout_ms: 5000
sync:
  ready_timeout_ms: 30000
  readiness_pairs: 3
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.command_timeout, Duration::from_secs(5));
        assert_eq!(config.command_poll, Duration::from_millis(10));
        assert_eq!(config.sync.ready_timeout, Duration::from_secs(30));
        assert_eq!(config.sync.readiness_pairs, 3);
        assert_eq!(config.sync.startup_signature, STARTUP_SIGNATURE);
    }

    #[test]
    fn test_single_pair_rejected() {
        let mut config = EngineConfig::default();
        config.sync.readiness_pairs = 1;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_signature_without_terminator_rejected() {
        let mut config = EngineConfig::default();
        config.sync.startup_signature = "OK 2 0 STARTUP".to_string();
        assert!(config.validate().is_err());
    }
}
