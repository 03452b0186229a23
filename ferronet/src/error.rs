//! Error types for ferronet.
//!
//! [`Error`] is the closed set of failure kinds a caller sees. Every variant
//! carries the host it happened on, so a batch run over many devices can be
//! diagnosed from the message alone. [`TransportError`] describes what went
//! wrong below the session and is converted with [`TransportError::into_error`]
//! at the connection boundary.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferronet operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure: socket errors, host key problems, the peer
    /// closing the channel.
    #[error("Host {host} connection error: {reason}")]
    Connection { host: String, reason: String },

    /// Credentials rejected or the handshake was torn down.
    #[error("Host {host} authentication error: {reason}")]
    Authentication { host: String, reason: String },

    /// No terminating pattern arrived within the timeout.
    #[error("Host {host} timeout error: {reason}")]
    Timeout { host: String, reason: String },

    /// A commit was rejected by the device.
    #[error("Host {host} commit error: {reason}")]
    Commit { host: String, reason: String },

    /// Invalid arguments or a session that cannot be driven any further
    /// (unknown device type, empty prompt, failed mode transition).
    #[error("Host {host} usage error: {reason}")]
    Usage { host: String, reason: String },
}

impl Error {
    /// Build a usage error.
    pub fn usage(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Usage {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Build a timeout error.
    pub fn timeout(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Timeout {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Build a commit error.
    pub fn commit(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Commit {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Host the error happened on.
    pub fn host(&self) -> &str {
        match self {
            Error::Connection { host, .. }
            | Error::Authentication { host, .. }
            | Error::Timeout { host, .. }
            | Error::Commit { host, .. }
            | Error::Usage { host, .. } => host,
        }
    }

    /// Underlying reason, without the host prefix.
    pub fn reason(&self) -> &str {
        match self {
            Error::Connection { reason, .. }
            | Error::Authentication { reason, .. }
            | Error::Timeout { reason, .. }
            | Error::Commit { reason, .. }
            | Error::Usage { reason, .. } => reason,
        }
    }
}

/// Transport layer errors (socket, SSH handshake, Telnet login).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH protocol error while the session was being established
    #[error("SSH handshake failed: {0}")]
    Handshake(russh::Error),

    /// SSH protocol error on an established session
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key or agent error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key does not match the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// An algorithm name in the SSH options is not supported
    #[error("Unsupported {kind} algorithm '{name}'")]
    UnsupportedAlgorithm { kind: &'static str, name: String },

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Convert into the caller-facing error kind, tagging it with `host`.
    pub fn into_error(self, host: &str) -> Error {
        let host = host.to_string();
        let reason = self.to_string();
        match self {
            TransportError::Handshake(_)
            | TransportError::AuthenticationFailed { .. }
            | TransportError::Key(_) => Error::Authentication { host, reason },
            TransportError::Timeout(_) => Error::Timeout { host, reason },
            _ => Error::Connection { host, reason },
        }
    }
}

/// Result type alias using ferronet's Error.
pub type Result<T> = std::result::Result<T, Error>;
