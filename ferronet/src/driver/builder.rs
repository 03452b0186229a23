//! Builder for creating sessions.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use super::session::Session;
use crate::error::{Error, Result};
use crate::parse::StructuredParser;
use crate::platform::{self, VendorProfile};
use crate::transport::{ConnectionParams, Protocol, SshOptions};

/// Builder for constructing sessions.
///
/// # Example
///
/// ```rust,no_run
/// use ferronet::SessionBuilder;
///
/// # async fn example() -> Result<(), ferronet::Error> {
/// let mut session = SessionBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .device_type("cisco_ios")
///     .connect()
///     .await?;
///
/// let version = session.send_command("show version").await?;
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    params: ConnectionParams,
    device_type: Option<String>,
    custom_profile: Option<VendorProfile>,
    parser: Option<Arc<dyn StructuredParser>>,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self::from_params(ConnectionParams::new(host))
    }

    /// Start from complete connection parameters (e.g. loaded from a file).
    pub fn from_params(params: ConnectionParams) -> Self {
        Self {
            params,
            device_type: None,
            custom_profile: None,
            parser: None,
        }
    }

    /// Set the port (default: 22 for SSH, 23 for Telnet).
    pub fn port(mut self, port: u16) -> Self {
        self.params.port = Some(port);
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.params.protocol = protocol;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.params.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.params.password = Some(SecretString::new(password.into().into_boxed_str()));
        self
    }

    /// Set the privilege (enable) secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.params.secret = Some(SecretString::new(secret.into().into_boxed_str()));
        self
    }

    /// Set the connect and read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.params.timeout = timeout;
        self
    }

    /// Set the SSH options.
    pub fn ssh(mut self, ssh: SshOptions) -> Self {
        self.params.ssh = ssh;
        self
    }

    /// Set the device type (e.g., "cisco_ios", "juniper_junos").
    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Use a custom vendor profile instead of a built-in one.
    pub fn custom_profile(mut self, profile: VendorProfile) -> Self {
        self.custom_profile = Some(profile);
        self
    }

    pub fn parser(mut self, parser: Arc<dyn StructuredParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Build the session.
    ///
    /// This creates the session but does not connect. Call `connect()` on
    /// the returned session to establish the connection.
    pub fn build(self) -> Result<Session> {
        let host = self.params.host.clone();
        if host.is_empty() {
            return Err(Error::usage(host, "Host must be set"));
        }

        let profile = if let Some(custom) = self.custom_profile {
            Arc::new(custom)
        } else if let Some(device_type) = self.device_type {
            platform::lookup(&device_type).ok_or_else(|| {
                Error::usage(
                    &host,
                    format!(
                        "Unsupported device_type: currently supported platforms are: {}",
                        platform::supported_device_types().join(", ")
                    ),
                )
            })?
        } else {
            return Err(Error::usage(host, "Device type must be set"));
        };

        let mut session = Session::new(self.params, profile);
        if let Some(parser) = self.parser {
            session.set_parser(parser);
        }
        Ok(session)
    }

    /// Build the session and connect it.
    pub async fn connect(self) -> Result<Session> {
        let mut session = self.build()?;
        session.connect().await?;
        Ok(session)
    }
}
