//! Runner for the `eltest` binary.
//!
//! Loads configuration, opens the serial transport, and runs one action
//! against the module: synchronize, read its identity, send a raw command,
//! or install certificates.

pub mod actions;
pub mod config;

use eltest_at_protocol::AtError;
use eltest_engine::EngineError;
use eltest_transport::TransportError;
use thiserror::Error;

/// Errors that end a runner invocation.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Protocol(#[from] AtError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
