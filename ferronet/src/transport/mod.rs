//! Byte-channel transports.
//!
//! A transport moves raw bytes to and from the device and knows nothing
//! about prompts. SSH is implemented on top of russh, Telnet on a plain
//! TCP stream with minimal option negotiation.

pub mod algorithms;
pub mod config;
mod ssh;
mod telnet;

use async_trait::async_trait;

pub use config::{AddressFamily, ConnectionParams, HostKeyVerification, Protocol, SshOptions};
pub use ssh::{SshTransport, SshTunnel};
pub use telnet::TelnetTransport;

use crate::error::TransportError;

/// Interactive byte channel to a device.
#[async_trait]
pub trait Transport: Send {
    /// Write all of `data`.
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Wait for the next chunk of at most `max` bytes.
    ///
    /// Never returns an empty chunk: end of stream is
    /// [`TransportError::Disconnected`]. Must be cancel safe, the caller
    /// bounds every read with a timeout.
    async fn read(&mut self, max: usize) -> Result<Vec<u8>, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;

    /// Handle for opening further connections through this one.
    fn tunnel(&self) -> Option<SshTunnel> {
        None
    }
}

/// Open and log into the transport selected by `params.protocol`.
pub async fn open(params: &ConnectionParams) -> Result<Box<dyn Transport>, TransportError> {
    match params.protocol {
        Protocol::Ssh => Ok(Box::new(SshTransport::connect(params).await?)),
        Protocol::Telnet => Ok(Box::new(TelnetTransport::connect(params).await?)),
    }
}
