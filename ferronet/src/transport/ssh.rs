//! SSH transport implementation using russh.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::BytesMut;
use log::{debug, info, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg, SshId};
use secrecy::ExposeSecret;
use tokio::net::{TcpSocket, TcpStream};

use super::Transport;
use super::algorithms;
use super::config::{ConnectionParams, HostKeyVerification, SshOptions};
use crate::error::TransportError;

/// SSH transport: one interactive shell channel with a PTY.
pub struct SshTransport {
    session: Arc<Handle<SshHandler>>,
    channel: Channel<Msg>,
    /// Data received but not yet handed out by `read`.
    pending: BytesMut,
}

/// Shared handle to an established SSH session, used to tunnel further
/// connections through it (direct-tcpip).
#[derive(Clone)]
pub struct SshTunnel(Arc<Handle<SshHandler>>);

impl std::fmt::Debug for SshTunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SshTunnel").finish_non_exhaustive()
    }
}

impl SshTransport {
    /// Connect to the SSH server, authenticate and open the shell.
    pub async fn connect(params: &ConnectionParams) -> Result<Self, TransportError> {
        let options = &params.ssh;
        let port = params.port();

        let config = Arc::new(client::Config {
            client_id: SshId::Standard(format!("SSH-2.0-{}", options.client_version)),
            preferred: algorithms::preferred(options)?,
            inactivity_timeout: Some(params.timeout),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));
        let handler = SshHandler {
            host: params.host.clone(),
            port,
            host_key_verification: options.host_key_verification.clone(),
            known_hosts_path: options.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
            forward_agent_to: if options.agent_forwarding {
                agent_socket(options)
            } else {
                None
            },
        };

        info!(
            "Host {}: Establishing SSH connection to port {}",
            params.host, port
        );
        let handshake = async {
            match &options.tunnel {
                Some(tunnel) => {
                    let channel = tunnel
                        .0
                        .channel_open_direct_tcpip(
                            params.host.clone(),
                            u32::from(port),
                            "127.0.0.1",
                            0,
                        )
                        .await?;
                    Ok::<_, TransportError>(
                        client::connect_stream(config, channel.into_stream(), handler).await,
                    )
                }
                None => {
                    let stream = open_tcp(params, port).await?;
                    Ok::<_, TransportError>(client::connect_stream(config, stream, handler).await)
                }
            }
        };

        // one deadline covers the handshake, authentication and the shell request
        let establish = async {
            let mut session = handshake.await?.map_err(|e| {
                // check_server_key stores a detailed error so it can be
                // surfaced instead of the generic russh::Error::UnknownKey
                match host_key_error.lock().ok().and_then(|mut slot| slot.take()) {
                    Some(hk_err) => hk_err,
                    None => TransportError::Handshake(e),
                }
            })?;
            Self::authenticate(&mut session, params).await?;
            Self::open_shell(session, options).await
        };
        let (session, channel) = tokio::time::timeout(params.timeout, establish)
            .await
            .map_err(|_| TransportError::Timeout(params.timeout))??;

        info!("Host {}: SSH connection is established", params.host);
        Ok(Self {
            session,
            channel,
            pending: BytesMut::with_capacity(8192),
        })
    }

    /// Open the session channel and start a shell on a PTY.
    async fn open_shell(
        session: Handle<SshHandler>,
        options: &SshOptions,
    ) -> Result<(Arc<Handle<SshHandler>>, Channel<Msg>), TransportError> {
        let session = Arc::new(session);
        let channel = session.channel_open_session().await?;
        if options.agent_forwarding {
            channel.agent_forward(true).await?;
        }
        channel
            .request_pty(
                true,
                &options.terminal_type,
                options.terminal_width,
                options.terminal_height,
                0,
                0,
                &[],
            )
            .await?;
        channel.request_shell(true).await?;
        Ok((session, channel))
    }

    /// Try client keys, then the agent, then the password.
    async fn authenticate(
        session: &mut Handle<SshHandler>,
        params: &ConnectionParams,
    ) -> Result<(), TransportError> {
        let user = params.username.as_str();
        let options = &params.ssh;

        for path in &options.client_keys {
            let passphrase = options.passphrase.as_ref().map(|p| p.expose_secret());
            let key = load_secret_key(path, passphrase)
                .map_err(|e| TransportError::Key(format!("{}: {}", path.display(), e)))?;
            let hash_alg = session.best_supported_rsa_hash().await?.flatten();
            let result = session
                .authenticate_publickey(user, PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg))
                .await?;
            if result.success() {
                debug!("Host {}: authenticated with key {}", params.host, path.display());
                return Ok(());
            }
        }

        #[cfg(unix)]
        if options.client_keys.is_empty() && Self::authenticate_with_agent(session, params).await? {
            return Ok(());
        }

        if let Some(password) = &params.password {
            let result = session
                .authenticate_password(user, password.expose_secret())
                .await?;
            if result.success() {
                return Ok(());
            }
        } else if options.client_keys.is_empty()
            && session.authenticate_none(user).await?.success()
        {
            return Ok(());
        }

        Err(TransportError::AuthenticationFailed {
            user: user.to_string(),
        })
    }

    /// Offer every identity held by the ssh-agent.
    #[cfg(unix)]
    async fn authenticate_with_agent(
        session: &mut Handle<SshHandler>,
        params: &ConnectionParams,
    ) -> Result<bool, TransportError> {
        use russh::keys::agent::client::AgentClient;

        let Some(path) = agent_socket(&params.ssh) else {
            return Ok(false);
        };
        let mut agent = match AgentClient::connect_uds(&path).await {
            Ok(agent) => agent,
            Err(e) => {
                warn!(
                    "Host {}: ssh-agent at {} is unavailable: {}",
                    params.host,
                    path.display(),
                    e
                );
                return Ok(false);
            }
        };

        let identities = agent
            .request_identities()
            .await
            .map_err(|e| TransportError::Key(e.to_string()))?;

        for identity in identities {
            let hash_alg = session.best_supported_rsa_hash().await?.flatten();
            match session
                .authenticate_publickey_with(&params.username, identity, hash_alg, &mut agent)
                .await
            {
                Ok(result) if result.success() => return Ok(true),
                Ok(_) => {}
                Err(e) => debug!("Host {}: agent signature failed: {:?}", params.host, e),
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.channel.data(data).await?;
        Ok(())
    }

    async fn read(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
        loop {
            if !self.pending.is_empty() {
                let n = self.pending.len().min(max);
                return Ok(self.pending.split_to(n).to_vec());
            }

            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => self.pending.extend_from_slice(&data),
                Some(ChannelMsg::ExtendedData { data, .. }) => self.pending.extend_from_slice(&data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(TransportError::Disconnected);
                }
                Some(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // the peer may already have gone away
        let _ = self.channel.eof().await;
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }

    fn tunnel(&self) -> Option<SshTunnel> {
        Some(SshTunnel(self.session.clone()))
    }
}

/// Resolve the host and connect, honouring the address family and the
/// local bind address.
async fn open_tcp(params: &ConnectionParams, port: u16) -> Result<TcpStream, TransportError> {
    let options = &params.ssh;
    let failed = |source: io::Error| TransportError::ConnectionFailed {
        host: params.host.clone(),
        port,
        source,
    };

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((params.host.as_str(), port))
        .await
        .map_err(failed)?
        .filter(|addr| options.family.accepts(addr))
        .collect();

    let mut last_error = io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        "no address of the requested family",
    );
    for addr in addrs {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(failed)?;
        if let Some(local) = options.local_addr {
            socket.bind(local).map_err(failed)?;
        }
        match socket.connect(addr).await {
            Ok(stream) => {
                stream.set_nodelay(true).map_err(failed)?;
                return Ok(stream);
            }
            Err(e) => {
                debug!("Host {}: connect to {} failed: {}", params.host, addr, e);
                last_error = e;
            }
        }
    }
    Err(failed(last_error))
}

/// Agent socket from the options or `SSH_AUTH_SOCK`.
fn agent_socket(options: &SshOptions) -> Option<PathBuf> {
    options
        .agent_path
        .clone()
        .or_else(|| std::env::var_os("SSH_AUTH_SOCK").map(PathBuf::from))
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key error for connect() to surface instead of the
    /// generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
    /// Local agent socket that forwarded agent channels are bridged to.
    forward_agent_to: Option<PathBuf>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> Result<bool, russh::Error> {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        Ok(false)
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    warn!(
                        "Host {}: learning unknown host key for port {}",
                        self.host, self.port
                    );
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Host {}: failed to save host key: {}", self.host, e);
                    }
                    Ok(true)
                }
                Err(e) => self.reject(e),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        }
    }

    async fn server_channel_open_agent_forward(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut client::Session,
    ) -> Result<(), Self::Error> {
        let Some(path) = self.forward_agent_to.clone() else {
            warn!("Host {}: refusing agent channel, no agent socket", self.host);
            return Ok(());
        };
        bridge_agent(self.host.clone(), channel, path);
        Ok(())
    }
}

/// Copy a forwarded agent channel to the local agent until either side closes.
#[cfg(unix)]
fn bridge_agent(host: String, channel: Channel<Msg>, path: PathBuf) {
    tokio::spawn(async move {
        match tokio::net::UnixStream::connect(&path).await {
            Ok(mut agent) => {
                let mut stream = channel.into_stream();
                if let Err(e) = tokio::io::copy_bidirectional(&mut stream, &mut agent).await {
                    debug!("Host {}: agent forwarding ended: {}", host, e);
                }
            }
            Err(e) => warn!(
                "Host {}: cannot reach agent at {}: {}",
                host,
                path.display(),
                e
            ),
        }
    });
}

#[cfg(not(unix))]
fn bridge_agent(host: String, _channel: Channel<Msg>, _path: PathBuf) {
    warn!("Host {}: agent forwarding is only supported on unix", host);
}
