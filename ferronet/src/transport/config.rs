//! Connection parameters.
//!
//! Parameters are plain data and deserialize from JSON/YAML inventories:
//!
//! ```json
//! {
//!   "host": "10.0.0.1",
//!   "username": "admin",
//!   "password": "hunter2",
//!   "protocol": "ssh",
//!   "timeout": 7.5,
//!   "ssh": { "host_key_verification": "disabled" }
//! }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use super::ssh::SshTunnel;

/// Default per-read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Wire protocol used to reach the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Ssh,
    Telnet,
}

impl Protocol {
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Ssh => 22,
            Protocol::Telnet => 23,
        }
    }
}

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

/// Address family used when resolving the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    #[default]
    Any,
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::Ipv4 => addr.is_ipv4(),
            AddressFamily::Ipv6 => addr.is_ipv6(),
        }
    }
}

/// Everything needed to reach and log into one device.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionParams {
    /// Hostname or IP address.
    pub host: String,

    #[serde(default)]
    pub username: String,

    #[serde(default, deserialize_with = "optional_secret")]
    pub password: Option<SecretString>,

    /// Privilege (enable) or cmdline-mode password.
    #[serde(default, deserialize_with = "optional_secret")]
    pub secret: Option<SecretString>,

    /// Defaults to 22 for SSH and 23 for Telnet.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub protocol: Protocol,

    /// Per-read timeout, also bounds connection establishment.
    #[serde(default = "default_timeout", deserialize_with = "float_seconds")]
    pub timeout: Duration,

    #[serde(default)]
    pub ssh: SshOptions,
}

impl ConnectionParams {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: String::new(),
            password: None,
            secret: None,
            port: None,
            protocol: Protocol::default(),
            timeout: DEFAULT_TIMEOUT,
            ssh: SshOptions::default(),
        }
    }

    /// Effective port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }
}

/// SSH specific knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SshOptions {
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts. `None` uses `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,

    /// Source address to bind before connecting.
    pub local_addr: Option<SocketAddr>,

    /// Private keys tried in order before the agent and the password.
    pub client_keys: Vec<PathBuf>,

    #[serde(deserialize_with = "optional_secret")]
    pub passphrase: Option<SecretString>,

    /// Open the connection through an existing SSH session.
    #[serde(skip)]
    pub tunnel: Option<SshTunnel>,

    pub agent_forwarding: bool,

    /// ssh-agent socket. `None` falls back to `SSH_AUTH_SOCK`.
    pub agent_path: Option<PathBuf>,

    /// Software version advertised in the SSH identification string.
    pub client_version: String,

    pub family: AddressFamily,

    /// Algorithm preferences by name. Empty lists keep the russh defaults.
    pub kex_algs: Vec<String>,
    pub encryption_algs: Vec<String>,
    pub mac_algs: Vec<String>,
    pub compression_algs: Vec<String>,
    pub signature_algs: Vec<String>,

    pub terminal_type: String,
    pub terminal_width: u32,
    pub terminal_height: u32,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            local_addr: None,
            client_keys: Vec::new(),
            passphrase: None,
            tunnel: None,
            agent_forwarding: false,
            agent_path: None,
            client_version: "ferronet".to_string(),
            family: AddressFamily::default(),
            kex_algs: Vec::new(),
            encryption_algs: Vec::new(),
            mac_algs: Vec::new(),
            compression_algs: Vec::new(),
            signature_algs: Vec::new(),
            terminal_type: "dumb".to_string(),
            terminal_width: 511,
            terminal_height: 24,
        }
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn float_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

fn optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let secret = Option::<String>::deserialize(deserializer)?;
    Ok(secret.map(|s| SecretString::new(s.into_boxed_str())))
}
