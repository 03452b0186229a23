//! # Ferronet
//!
//! Async SSH and Telnet CLI session engine for network device automation.
//!
//! Ferronet logs into routers, switches and firewalls, discovers their prompt
//! without prior knowledge of its text, and runs commands by reading until
//! the prompt comes back. Mode changes (privileged exec, configuration, the
//! JunOS shell) and commits are driven from per-vendor profiles.
//!
//! ## Features
//!
//! - Async SSH connections via russh, Telnet over plain TCP
//! - Prompt discovery and tail-searching pattern buffer
//! - Privilege, configuration and CLI mode handling with commit support
//! - 18 built-in device types, custom profiles via [`VendorProfile`]
//! - Optional TextFSM parsing (`textfsm` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferronet::ConnectionParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferronet::Error> {
//!     let mut params = ConnectionParams::new("192.168.1.1");
//!     params.username = "admin".to_string();
//!
//!     let mut session = ferronet::create("cisco_ios", params)?;
//!     session.connect().await?;
//!
//!     let output = session.send_command("show version").await?;
//!     println!("{}", output);
//!
//!     session
//!         .send_config_set(&["interface Gi0/1", "description uplink"])
//!         .await?;
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod parse;
pub mod platform;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use driver::{
    ConfigSetOptions, ExpectOptions, Mode, Response, SendOptions, Session, SessionBuilder,
};
pub use error::{Error, Result, TransportError};
pub use parse::{ParseError, Record, StructuredParser};
pub use platform::{VendorBehavior, VendorProfile};
pub use transport::{ConnectionParams, HostKeyVerification, Protocol, SshOptions, Transport};

/// Create an unconnected session for a built-in device type.
pub fn create(device_type: &str, params: ConnectionParams) -> Result<Session> {
    SessionBuilder::from_params(params)
        .device_type(device_type)
        .build()
}

/// All supported device types, sorted.
pub fn platforms() -> Vec<&'static str> {
    platform::supported_device_types()
}
