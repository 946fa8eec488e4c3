//! Runner configuration: a YAML file plus command-line overrides.
//!
//! ```yaml
//! platform: rpi4
//! serial:
//!   port: /dev/ttyS0
//!   baud_rate: 115200
//!   lines:
//!     reset: { signal: rts, active_low: true }
//! engine:
//!   command_timeout_ms: 120000
//!   sync:
//!     ready_timeout_ms: 120000
//! ```

use crate::{RunnerError, RunnerResult};
use clap::Args;
use eltest_engine::EngineConfig;
use eltest_transport::SerialConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Configuration file read when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "eltest_config.yaml";

/// Everything the runner needs before opening the module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Free-form name of the host platform, echoed in reports.
    pub platform: Option<String>,
    /// Serial transport settings.
    pub serial: SerialConfig,
    /// Engine timing.
    pub engine: EngineConfig,
}

impl RunnerConfig {
    /// Parse a configuration document.
    pub fn from_yaml(text: &str) -> RunnerResult<Self> {
        let config: RunnerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// With `path` unset, the default file is used if present and built-in
    /// defaults otherwise. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> RunnerResult<Self> {
        let path = match path {
            Some(p) => p,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Path::new(DEFAULT_CONFIG_PATH),
            None => {
                info!("no configuration file, using defaults");
                return Ok(RunnerConfig::default());
            }
        };
        let text = std::fs::read_to_string(path)?;
        info!(path = %path.display(), "loaded configuration");
        Self::from_yaml(&text)
    }

    /// Check the combined configuration.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.serial.port.is_empty() {
            return Err(RunnerError::ConfigError("serial port is empty".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(RunnerError::ConfigError("baud rate must be positive".to_string()));
        }
        self.serial.lines.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Serial device path.
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Serial baud rate.
    #[arg(long, global = true)]
    pub baud: Option<u32>,

    /// Default command timeout in milliseconds.
    #[arg(long, global = true)]
    pub command_timeout_ms: Option<u64>,

    /// Mandatory readiness wait in milliseconds.
    #[arg(long, global = true)]
    pub ready_timeout_ms: Option<u64>,

    /// Number of quiet/ready wait pairs during reset.
    #[arg(long, global = true)]
    pub readiness_pairs: Option<usize>,

    /// Host platform name.
    #[arg(long, global = true)]
    pub platform: Option<String>,
}

impl ConfigOverrides {
    /// Apply every value that was given, then re-validate.
    pub fn apply(&self, config: &mut RunnerConfig) -> RunnerResult<()> {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(ms) = self.command_timeout_ms {
            config.engine.command_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.ready_timeout_ms {
            config.engine.sync.ready_timeout = Duration::from_millis(ms);
        }
        if let Some(pairs) = self.readiness_pairs {
            config.engine.sync.readiness_pairs = pairs;
        }
        if let Some(platform) = &self.platform {
            config.platform = Some(platform.clone());
        }
        config.validate()
    }
}
