//! Protocol engine for ExpressLink modules.
//!
//! The engine owns a [`Transport`](eltest_transport::Transport) and offers
//! two things on top of it:
//!
//! - **Command exchange** ([`ProtocolEngine::send_command`]): write a request
//!   and poll for a newline-terminated response, failing with
//!   [`EngineError::ProtocolTimeout`] when none arrives in time.
//! - **Synchronization** ([`ProtocolEngine::reset_device`]): sequence the
//!   wake/reset lines and poll the event line to bring a module from an
//!   unknown power-on state to a verified clean startup.
//!
//! Every wait is a bounded sleep-then-check loop; nothing runs in the
//! background and nothing is retried automatically.
//!
//! ```rust,ignore
//! use eltest_engine::{EngineConfig, ProtocolEngine};
//! use eltest_transport::{SerialConfig, SerialTransport};
//!
//! let transport = SerialTransport::open(&SerialConfig::default())?;
//! let mut engine = ProtocolEngine::new(transport, EngineConfig::default())?;
//! engine.reset_device()?;
//! let info = engine.device_info()?;
//! ```

mod conf;
mod config;
mod engine;
mod error;
mod observer;
pub mod poll;
mod sync;

pub use conf::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use observer::*;
pub use sync::*;
