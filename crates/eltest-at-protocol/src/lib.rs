//! ExpressLink AT Command Protocol
//!
//! This crate provides types and utilities for talking to an ExpressLink
//! module over its UART AT command interface.
//!
//! # Protocol Overview
//!
//! The protocol is plain text, framed by terminator:
//!
//! - **Commands** (host → module): `AT+<COMMAND> [args]` terminated with `\r\n`
//! - **Responses** (module → host): one line terminated with `\n`, starting
//!   with `OK` on success or `ERR<code>` on failure
//! - **Encoding**: ISO-8859-1 in both directions
//!
//! A response is complete only once its trailing newline has arrived; there
//! are no length prefixes or checksums.
//!
//! # Example
//!
//! ```rust,ignore
//! use eltest_at_protocol::{Command, ConfKey, Response};
//!
//! let cmd = Command::ConfQuery(ConfKey::Version);
//! assert_eq!(cmd.to_command_string(), "AT+CONF? Version\r\n");
//!
//! let response = Response::parse("OK v1.2.3\r\n")?;
//! assert_eq!(response.payload(), Some("v1.2.3"));
//! ```

mod codec;
mod commands;
mod error;
mod responses;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use responses::*;
